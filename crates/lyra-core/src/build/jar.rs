//! Concurrent jar archive sink.
//!
//! A [`Jar`] owns an archive being written and a task group of producers.
//! Producers run concurrently (class processing, resource collection, fat
//! merges) and funnel members into the writer one at a time; entry writes
//! are serialized behind a mutex, so member order in the archive follows
//! completion order, not submission order. [`Jar::finish`] joins the
//! producers and then closes the archive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::BuildError;
use crate::group::TaskGroup;

/// A single named entry destined for the archive.
#[derive(Debug, Clone)]
pub struct JarMember {
    pub name: String,
    pub data: Vec<u8>,
}

impl JarMember {
    pub fn from_string(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: text.into().into_bytes(),
        }
    }
}

struct JarInner {
    path: PathBuf,
    writer: Mutex<Option<ZipWriter<std::fs::File>>>,
}

/// Shared handle to an archive under construction.
#[derive(Clone)]
pub struct Jar {
    inner: Arc<JarInner>,
    tasks: TaskGroup<BuildError>,
}

impl std::fmt::Debug for Jar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jar").field("path", &self.inner.path).finish()
    }
}

impl Jar {
    /// Create (truncating) the archive at `path`.
    pub async fn create(path: &Path) -> Result<Self, BuildError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(path).await?.into_std().await;
        Ok(Self {
            inner: Arc::new(JarInner {
                path: path.to_path_buf(),
                writer: Mutex::new(Some(ZipWriter::new(file))),
            }),
            tasks: TaskGroup::new(),
        })
    }

    /// Path of the archive being written.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Schedule a producer task on the archive's group. Producers may clone
    /// the jar and schedule further tasks; `finish` joins them all.
    pub fn task<F>(&self, fut: F)
    where
        F: Future<Output = Result<(), BuildError>> + Send + 'static,
    {
        self.tasks.spawn(fut);
    }

    /// Append one member to the archive.
    pub async fn add(&self, member: JarMember) -> Result<(), BuildError> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.writer.lock().unwrap();
            let writer = guard
                .as_mut()
                .ok_or_else(|| std::io::Error::other("archive already closed"))?;
            writer.start_file(member.name.as_str(), SimpleFileOptions::default())?;
            writer.write_all(&member.data)?;
            Ok::<_, BuildError>(())
        })
        .await?
    }

    /// Join every producer task without closing the archive.
    pub async fn wait(&self) -> Result<(), BuildError> {
        self.tasks.wait().await
    }

    /// Join every producer and close the archive. The jar is unusable
    /// afterwards; further `add` calls fail.
    pub async fn finish(&self) -> Result<(), BuildError> {
        self.tasks.wait().await?;
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.writer.lock().unwrap();
            if let Some(writer) = guard.take() {
                writer.finish()?;
            }
            Ok::<_, BuildError>(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entry_names(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn members_from_concurrent_producers_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jar");
        let jar = Jar::create(&path).await.unwrap();

        for i in 0..8 {
            let jar = jar.clone();
            jar.clone().task(async move {
                jar.add(JarMember {
                    name: format!("entry-{i}.txt"),
                    data: vec![i as u8],
                })
                .await
            });
        }
        jar.finish().await.unwrap();

        let mut names = entry_names(&path);
        names.sort();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "entry-0.txt");
    }

    #[tokio::test]
    async fn entry_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jar");
        let jar = Jar::create(&path).await.unwrap();
        jar.add(JarMember::from_string("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"))
            .await
            .unwrap();
        jar.finish().await.unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name("META-INF/MANIFEST.MF").unwrap();
        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert_eq!(body, "Manifest-Version: 1.0\n");
    }

    #[tokio::test]
    async fn a_failing_producer_surfaces_through_finish() {
        let dir = tempfile::tempdir().unwrap();
        let jar = Jar::create(&dir.path().join("out.jar")).await.unwrap();
        jar.task(async { Err(BuildError::Io(std::io::Error::other("producer failed"))) });
        let err = jar.finish().await.unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
    }

    #[tokio::test]
    async fn add_after_finish_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let jar = Jar::create(&dir.path().join("out.jar")).await.unwrap();
        jar.finish().await.unwrap();
        let err = jar
            .add(JarMember::from_string("late.txt", "late"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
    }
}
