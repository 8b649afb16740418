//! The project aggregate: identity, repositories, artifacts, named task
//! groups, and manifest persistence.
//!
//! All reads and writes of project-owned collections go through accessor
//! methods over a single mutex; no call site touches the fields directly.
//! Resolution and network work always happen outside the lock.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, ResolveError};
use crate::paths::{self, MANIFEST_FILE};
use crate::{Artifact, ExtensionHost, TaskGroup};
use reqwest::Url;

/// Name of the default (unnamed) task group.
const DEFAULT_GROUP: &str = "";

#[derive(Debug, Default)]
struct State {
    name: String,
    group_id: String,
    repos: Vec<Url>,
    artifacts: Vec<Artifact>,
    plugins: Vec<String>,
}

/// On-disk shape of `lyra.json`. Repos and plugins are session state and are
/// deliberately not persisted.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectProxy {
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(rename = "Group", default, skip_serializing_if = "String::is_empty")]
    group: String,
    #[serde(rename = "Artifacts", default, skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<Artifact>,
}

/// Aggregate root for one build tree.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    state: Mutex<State>,
    groups: Mutex<HashMap<String, TaskGroup<anyhow::Error>>>,
}

impl Project {
    /// An empty project rooted at the given directory. Nothing is read from
    /// disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(State::default()),
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Load the project from `<root>/lyra.json`. A missing manifest is not
    /// an error and yields an empty project.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let project = Self::new(root);
        let manifest = paths::manifest_path(&project.root);
        if !manifest.exists() {
            return Ok(project);
        }
        let data = std::fs::read_to_string(&manifest)?;
        let proxy: ProjectProxy = serde_json::from_str(&data)?;
        {
            let mut state = project.state.lock().unwrap();
            state.name = proxy.name;
            state.group_id = proxy.group;
            state.artifacts = proxy.artifacts;
        }
        Ok(project)
    }

    /// Directory containing `lyra.json`, `src/` and `build/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True when the project manifest file exists on disk.
    pub fn manifest_exists(&self) -> bool {
        paths::manifest_path(&self.root).exists()
    }

    pub fn name(&self) -> String {
        self.state.lock().unwrap().name.clone()
    }

    pub fn group(&self) -> String {
        self.state.lock().unwrap().group_id.clone()
    }

    /// Set the project identity. Used by `init`.
    pub fn set_identity(&self, name: &str, group_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.name = name.to_string();
        state.group_id = group_id.to_string();
    }

    pub fn repos(&self) -> Vec<Url> {
        self.state.lock().unwrap().repos.clone()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.state.lock().unwrap().artifacts.clone()
    }

    pub fn plugins(&self) -> Vec<String> {
        self.state.lock().unwrap().plugins.clone()
    }

    /// Record a loaded extension's slug.
    pub fn add_plugin(&self, slug: &str) {
        self.state.lock().unwrap().plugins.push(slug.to_string());
    }

    /// Resolve every stored artifact's main URI into a classpath. Strictly
    /// sequential; the first resolution failure aborts.
    pub async fn classpath(&self, host: &ExtensionHost) -> Result<Vec<PathBuf>, ResolveError> {
        let mut classpath = Vec::new();
        for artifact in self.artifacts() {
            classpath.push(artifact.resolve(&host.resolvers).await?);
        }
        Ok(classpath)
    }

    /// Schedule work on the default task group.
    pub fn go<F>(&self, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.go_with(DEFAULT_GROUP, fut);
    }

    /// Schedule work on a named task group, lazily creating the group.
    pub fn go_with<F>(&self, id: &str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let group = {
            let mut groups = self.groups.lock().unwrap();
            groups.entry(id.to_string()).or_default().clone()
        };
        group.spawn(fut);
    }

    /// Wait for a named group. Unknown groups are trivially complete.
    pub async fn wait_for(&self, id: &str) -> anyhow::Result<()> {
        let group = self.groups.lock().unwrap().get(id).cloned();
        match group {
            Some(group) => group.wait().await,
            None => Ok(()),
        }
    }

    /// Wait for every task group, returning the first error encountered.
    pub async fn wait(&self) -> anyhow::Result<()> {
        let groups: Vec<_> = self.groups.lock().unwrap().values().cloned().collect();
        for group in groups {
            group.wait().await?;
        }
        Ok(())
    }

    /// Add a repository. Rejects when no manifest exists; de-duplicates by
    /// exact URI equality; unless a registered repo acceptor vouches for the
    /// URI, an unreachable repo is an error.
    pub async fn add_repo(&self, repo: Url, host: &ExtensionHost) -> anyhow::Result<()> {
        if !self.manifest_exists() {
            anyhow::bail!("no project in current directory");
        }

        if self.state.lock().unwrap().repos.contains(&repo) {
            return Ok(());
        }

        if !host.repo_acceptors.accepts(&repo) {
            let reachable = match host.client().get(repo.clone()).send().await {
                Ok(response) => response.status().is_success(),
                Err(_) => false,
            };
            if !reachable {
                anyhow::bail!("repo is unreachable: {repo}");
            }
        }

        let mut state = self.state.lock().unwrap();
        if !state.repos.contains(&repo) {
            state.repos.push(repo);
        }
        Ok(())
    }

    /// Add (or replace) an artifact. Identity is `(name, group)`: a stored
    /// artifact with matching identity is replaced in place, last write
    /// wins. The main URI must resolve; sources/docs resolution failures are
    /// downgraded to "not provided".
    pub async fn add_dependency(
        &self,
        mut artifact: Artifact,
        host: &ExtensionHost,
    ) -> anyhow::Result<()> {
        if !self.manifest_exists() {
            anyhow::bail!("no project in current directory");
        }

        artifact.resolve(&host.resolvers).await?;

        if let Err(err) = artifact.resolve_sources(&host.resolvers).await {
            tracing::warn!(artifact = %artifact.name, %err, "sources unavailable, dropping");
            artifact.sources = None;
        }
        if let Err(err) = artifact.resolve_docs(&host.resolvers).await {
            tracing::warn!(artifact = %artifact.name, %err, "docs unavailable, dropping");
            artifact.docs = None;
        }

        let mut state = self.state.lock().unwrap();
        match state.artifacts.iter().position(|a| a.same_as(&artifact)) {
            Some(index) => state.artifacts[index] = artifact,
            None => state.artifacts.push(artifact),
        }
        Ok(())
    }

    /// Persist the project to `<root>/lyra.json`, waiting for all in-flight
    /// task groups first so the saved state reflects only fully resolved
    /// artifacts. A trivially empty manifest is never written, so a real
    /// project file cannot be clobbered by a default-initialized project.
    pub async fn save(&self) -> anyhow::Result<()> {
        self.wait().await?;

        let proxy = {
            let state = self.state.lock().unwrap();
            ProjectProxy {
                name: state.name.clone(),
                group: state.group_id.clone(),
                artifacts: state.artifacts.clone(),
            }
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        proxy
            .serialize(&mut serializer)
            .map_err(PersistenceError::from)?;

        if buf.len() <= 2 {
            return Ok(());
        }
        tokio::fs::write(paths::manifest_path(&self.root), buf)
            .await
            .map_err(PersistenceError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn project_with_manifest() -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(paths::manifest_path(dir.path()), "{}").unwrap();
        let project = Project::load(dir.path()).unwrap();
        (dir, project)
    }

    fn file_artifact(name: &str, version: &str) -> Artifact {
        Artifact {
            name: name.to_string(),
            group: "com.example".to_string(),
            version: version.to_string(),
            main: format!("file:///libs/{name}-{version}.jar"),
            ..Artifact::default()
        }
    }

    #[tokio::test]
    async fn adding_same_identity_twice_keeps_the_later_artifact() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();

        project
            .add_dependency(file_artifact("widget", "1.0"), &host)
            .await
            .unwrap();
        project
            .add_dependency(file_artifact("widget", "2.0"), &host)
            .await
            .unwrap();

        let artifacts = project.artifacts();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].version, "2.0");
        assert_eq!(artifacts[0].main, "file:///libs/widget-2.0.jar");
    }

    #[tokio::test]
    async fn unresolvable_main_is_fatal_and_stores_nothing() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();

        let artifact = Artifact {
            name: "widget".into(),
            group: "com.example".into(),
            main: "mvn://com.example/widget".into(),
            ..Artifact::default()
        };
        assert!(project.add_dependency(artifact, &host).await.is_err());
        assert!(project.artifacts().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_sources_are_cleared_not_fatal() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();

        let mut artifact = file_artifact("widget", "1.0");
        artifact.sources = Some("mvn://com.example/widget-sources".into());
        project.add_dependency(artifact, &host).await.unwrap();

        let stored = &project.artifacts()[0];
        assert_eq!(stored.sources, None);
    }

    #[tokio::test]
    async fn add_dependency_without_a_manifest_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new(dir.path());
        let host = ExtensionHost::new();
        let err = project
            .add_dependency(file_artifact("widget", "1.0"), &host)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no project"));
    }

    #[tokio::test]
    async fn add_repo_requires_manifest_and_deduplicates() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();
        // Acceptor vouches for everything so no network is involved.
        host.repo_acceptors.register(|_| true);

        let repo = Url::parse("https://repo.example.com/maven2").unwrap();
        project.add_repo(repo.clone(), &host).await.unwrap();
        project.add_repo(repo.clone(), &host).await.unwrap();
        assert_eq!(project.repos(), vec![repo]);

        let orphan = Project::new(std::env::temp_dir().join("definitely-missing-lyra"));
        let repo = Url::parse("https://repo.example.com/maven2").unwrap();
        assert!(orphan.add_repo(repo, &host).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_repo_is_an_error() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();

        // Reserved TEST-NET address, nothing listens there.
        let repo = Url::parse("http://192.0.2.1:1/maven2").unwrap();
        let err = project.add_repo(repo, &host).await.unwrap_err();
        assert!(err.to_string().contains("unreachable"));
        assert!(project.repos().is_empty());
    }

    #[tokio::test]
    async fn save_waits_for_task_groups_and_persists_artifacts() {
        let (dir, project) = project_with_manifest();
        let project = Arc::new(project);
        let host = ExtensionHost::new();

        project.set_identity("demo", "com.example");
        {
            let project = Arc::clone(&project);
            let host = Arc::clone(&host);
            project.clone().go(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                project
                    .add_dependency(file_artifact("widget", "1.0"), &host)
                    .await
            });
        }

        project.save().await.unwrap();

        let data = std::fs::read_to_string(paths::manifest_path(dir.path())).unwrap();
        assert!(data.contains("    \"Name\": \"demo\""), "4-space indent: {data}");
        assert!(data.contains("\"Group\": \"com.example\""));
        assert!(data.contains("\"widget\""));

        let reloaded = Project::load(dir.path()).unwrap();
        assert_eq!(reloaded.name(), "demo");
        assert_eq!(reloaded.artifacts().len(), 1);
    }

    #[tokio::test]
    async fn empty_projects_are_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new(dir.path());
        project.save().await.unwrap();
        assert!(!paths::manifest_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn wait_surfaces_the_first_group_error() {
        let (_dir, project) = project_with_manifest();
        project.go_with("fetch", async { Err(anyhow::anyhow!("network down")) });
        project.go_with("fetch", async { Ok(()) });

        let err = project.wait_for("fetch").await.unwrap_err();
        assert_eq!(err.to_string(), "network down");
        // Unknown groups are trivially complete.
        project.wait_for("unknown").await.unwrap();
    }
}
