//! Incremental build orchestrator.
//!
//! A build runs the pre-compile hooks, resolves the project classpath, then
//! fans out one task per module under `src/`. Each module compares the
//! newest modification time of its source tree against its compiled output;
//! a stale output tree is deleted wholesale and recompiled (invalidation is
//! per-module, never per-file). Packaging is scheduled regardless, with its
//! own cheap skip check against the archive's modification time.
//!
//! Failures surface through the task-group join with first-error-wins;
//! sibling modules keep building to completion.

pub mod class;
pub mod jar;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use crate::error::BuildError;
use crate::group::TaskGroup;
use crate::toolchain::CompileOptions;
use crate::{ExtensionHost, Project, paths};

pub use class::ClassFile;
pub use jar::{Jar, JarMember};

/// Switches for one build invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Merge include-flagged artifacts into each module archive.
    pub fat: bool,
    /// Also package a `<module>-sources.jar` per module.
    pub sources: bool,
}

/// Compile and package every module under the project's `src/` directory.
pub async fn build(
    project: Arc<Project>,
    host: Arc<ExtensionHost>,
    options: BuildOptions,
) -> Result<(), BuildError> {
    for hook in host.build.pre_compile_hooks() {
        hook(&project).map_err(BuildError::Hook)?;
    }

    let classpath = project.classpath(&host).await?;

    let src = paths::src_dir(project.root());
    if !src.exists() {
        tracing::warn!(root = %project.root().display(), "no src directory, nothing to build");
        return Ok(());
    }

    let group: TaskGroup<BuildError> = TaskGroup::new();
    let mut entries = tokio::fs::read_dir(&src).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let module = entry.file_name().to_string_lossy().into_owned();
        group.spawn(build_module(
            Arc::clone(&project),
            Arc::clone(&host),
            group.clone(),
            module,
            classpath.clone(),
            options,
        ));
    }
    group.wait().await
}

/// Compile one module when stale, then schedule its packaging tasks onto
/// the build group.
async fn build_module(
    project: Arc<Project>,
    host: Arc<ExtensionHost>,
    group: TaskGroup<BuildError>,
    module: String,
    classpath: Vec<PathBuf>,
    options: BuildOptions,
) -> Result<(), BuildError> {
    let root = project.root().to_path_buf();
    let java_dir = paths::module_java_dir(&root, &module);
    let output_dir = paths::module_output_dir(&root, &module);

    // Resource edits never invalidate compiled output; the packaging skip
    // check picks them up instead.
    let source_time = newest_time(&java_dir);
    let mut output_time = newest_time(&output_dir);

    if output_time < source_time {
        let sources = collect_sources(&java_dir);
        if sources.is_empty() {
            tracing::debug!(module, "no java sources, skipping compile");
        } else {
            if output_dir.exists() {
                tokio::fs::remove_dir_all(&output_dir).await?;
            }
            tracing::info!(module, sources = sources.len(), "compiling");
            host.toolchain
                .compile(CompileOptions {
                    classpath,
                    sources,
                    out_dir: output_dir.clone(),
                })
                .await?;
            output_time = SystemTime::now();
        }
    } else {
        tracing::debug!(module, "output up to date");
    }

    {
        let project = Arc::clone(&project);
        let host = Arc::clone(&host);
        let module = module.clone();
        group.spawn(package(project, host, module, output_time, options.fat));
    }
    if options.sources {
        group.spawn(package_sources(project, module, output_time));
    }
    Ok(())
}

/// Package one module's classes and resources into `build/jar/<module>.jar`.
async fn package(
    project: Arc<Project>,
    host: Arc<ExtensionHost>,
    module: String,
    output_time: SystemTime,
    fat: bool,
) -> Result<(), BuildError> {
    let root = project.root().to_path_buf();
    let jar_path = paths::module_jar_path(&root, &module);
    let output_dir = paths::module_output_dir(&root, &module);
    let resources_dir = paths::module_resources_dir(&root, &module);

    let resource_time = newest_time(&resources_dir);
    let jar_time = file_time(&jar_path);
    if jar_time > output_time && jar_time > resource_time {
        tracing::debug!(module, "archive up to date, skipping packaging");
        return Ok(());
    }

    tracing::info!(module, jar = %jar_path.display(), "packaging");
    let jar = Jar::create(&jar_path).await?;
    for hook in host.build.pre_package_hooks() {
        hook(&project, &jar).map_err(BuildError::Hook)?;
    }

    for path in files_under(&resources_dir) {
        let member = member_name(&resources_dir, &path);
        let sink = jar.clone();
        jar.task(async move {
            let data = tokio::fs::read(&path).await?;
            sink.add(JarMember { name: member, data }).await
        });
    }

    for path in files_under(&output_dir) {
        if path.extension().is_none_or(|ext| ext != "class") {
            continue;
        }
        let member = member_name(&output_dir, &path);
        let sink = jar.clone();
        let host = Arc::clone(&host);
        jar.task(async move {
            let data = tokio::fs::read(&path).await?;
            let mut class = ClassFile::parse(&data)?;
            for hook in host.build.package_class_hooks() {
                hook(&host.build, &sink, &mut class).map_err(BuildError::Hook)?;
            }
            sink.add(JarMember {
                name: member,
                data: class.into_bytes(),
            })
            .await
        });
    }

    if fat {
        for artifact in project.artifacts().into_iter().filter(|a| a.include) {
            let sink = jar.clone();
            let host = Arc::clone(&host);
            jar.task(async move {
                let path = artifact.resolve(&host.resolvers).await?;
                let members =
                    tokio::task::spawn_blocking(move || archive_members(&path)).await??;
                for member in members {
                    sink.add(member).await?;
                }
                Ok(())
            });
        }
    }

    jar.wait().await?;

    let mut manifest = String::from("Manifest-Version: 1.0\n");
    for (field, value) in host.build.manifest_entries() {
        manifest.push_str(&format!("{field}: {value}\n"));
    }
    jar.add(JarMember::from_string("META-INF/MANIFEST.MF", manifest))
        .await?;
    jar.finish().await
}

/// Package one module's raw `.java` sources into
/// `build/jar/<module>-sources.jar`.
async fn package_sources(
    project: Arc<Project>,
    module: String,
    output_time: SystemTime,
) -> Result<(), BuildError> {
    let root = project.root().to_path_buf();
    let jar_path = paths::module_sources_jar_path(&root, &module);
    let java_dir = paths::module_java_dir(&root, &module);

    if file_time(&jar_path) > output_time {
        tracing::debug!(module, "sources archive up to date, skipping");
        return Ok(());
    }

    let jar = Jar::create(&jar_path).await?;
    for path in collect_sources(&java_dir) {
        let member = member_name(&java_dir, &path);
        let sink = jar.clone();
        jar.task(async move {
            let data = tokio::fs::read(&path).await?;
            sink.add(JarMember { name: member, data }).await
        });
    }
    jar.finish().await
}

/// Newest modification time of any file under `dir`. An absent or empty
/// tree yields the epoch.
pub fn newest_time(dir: &Path) -> SystemTime {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .filter_map(|m| m.modified().ok())
        .max()
        .unwrap_or(UNIX_EPOCH)
}

fn file_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH)
}

/// Every `.java` file under `dir`, in walk order.
fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    files_under(dir)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
        .collect()
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// Archive member name for `path` relative to `base`, always with forward
/// slashes.
fn member_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read every member of an existing archive, skipping directories and its
/// manifest. Used for fat-jar merges.
fn archive_members(path: &Path) -> Result<Vec<JarMember>, BuildError> {
    use std::io::Read;

    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut members = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || entry.name() == "META-INF/MANIFEST.MF" {
            continue;
        }
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        members.push(JarMember {
            name: entry.name().to_string(),
            data,
        });
    }
    Ok(members)
}
