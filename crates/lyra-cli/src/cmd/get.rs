//! Get command

use std::sync::Arc;

use anyhow::Result;

use lyra_core::{ExtensionHost, Project};

/// Fetch each coordinate concurrently on the project's default task group.
pub async fn get(
    project: &Arc<Project>,
    host: &Arc<ExtensionHost>,
    coordinates: Vec<String>,
) -> Result<()> {
    for slug in coordinates {
        let project = Arc::clone(project);
        let host = Arc::clone(host);
        project.clone().go(async move { fetch(&project, &host, &slug).await });
    }
    project.wait().await
}

/// Try each registered parser in order. A parser error aborts the fetch; a
/// parsed artifact that cannot be added falls through to the next parser.
async fn fetch(project: &Project, host: &ExtensionHost, slug: &str) -> Result<()> {
    let repos = project.repos();
    for parser in host.parsers.all() {
        let artifact = parser.parse(slug, &repos).await?;
        match project.add_dependency(artifact, host).await {
            Ok(()) => {
                println!("Added {slug}");
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(slug, %err, "parsed artifact could not be added, trying next parser");
            }
        }
    }
    tracing::warn!(slug, "no parser produced a usable artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lyra_core::Artifact;
    use lyra_core::error::ParseError;
    use lyra_core::registry::parser::CoordinateParser;
    use reqwest::Url;

    struct FixedParser {
        artifact: Artifact,
    }

    #[async_trait]
    impl CoordinateParser for FixedParser {
        async fn parse(&self, _slug: &str, _repos: &[Url]) -> Result<Artifact, ParseError> {
            Ok(self.artifact.clone())
        }
    }

    struct FailingParser;

    #[async_trait]
    impl CoordinateParser for FailingParser {
        async fn parse(&self, slug: &str, _repos: &[Url]) -> Result<Artifact, ParseError> {
            Err(ParseError::Malformed(slug.to_string()))
        }
    }

    fn project_with_manifest() -> (tempfile::TempDir, Arc<Project>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lyra.json"), "{}").unwrap();
        let project = Arc::new(Project::load(dir.path()).unwrap());
        (dir, project)
    }

    #[tokio::test]
    async fn get_adds_the_parsed_artifact() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();
        host.parsers.register(Arc::new(FixedParser {
            artifact: Artifact {
                name: "widget".into(),
                group: "com.example".into(),
                version: "1.0".into(),
                main: "file:///libs/widget-1.0.jar".into(),
                ..Artifact::default()
            },
        }));

        get(&project, &host, vec!["com.example:widget:1.0".into()])
            .await
            .unwrap();

        let artifacts = project.artifacts();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "widget");
    }

    #[tokio::test]
    async fn a_parser_error_aborts_the_fetch() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();
        host.parsers.register(Arc::new(FailingParser));
        // A later parser that would succeed never runs.
        host.parsers.register(Arc::new(FixedParser {
            artifact: Artifact {
                name: "widget".into(),
                group: "com.example".into(),
                main: "file:///libs/widget.jar".into(),
                ..Artifact::default()
            },
        }));

        let err = get(&project, &host, vec!["junk".into()]).await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
        assert!(project.artifacts().is_empty());
    }

    #[tokio::test]
    async fn an_unaddable_artifact_falls_through_to_the_next_parser() {
        let (_dir, project) = project_with_manifest();
        let host = ExtensionHost::new();
        // First parser yields an artifact whose main URI cannot resolve.
        host.parsers.register(Arc::new(FixedParser {
            artifact: Artifact {
                name: "widget".into(),
                group: "com.example".into(),
                main: "mvn://unresolvable".into(),
                ..Artifact::default()
            },
        }));
        host.parsers.register(Arc::new(FixedParser {
            artifact: Artifact {
                name: "widget".into(),
                group: "com.example".into(),
                main: "file:///libs/widget.jar".into(),
                ..Artifact::default()
            },
        }));

        get(&project, &host, vec!["com.example:widget".into()])
            .await
            .unwrap();
        assert_eq!(project.artifacts()[0].main, "file:///libs/widget.jar");
    }
}
