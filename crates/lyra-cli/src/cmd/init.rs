//! Init command

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;

use lyra_core::maven::MAVEN_CENTRAL;
use lyra_core::{ExtensionHost, Project, paths};

/// Create the project skeleton: a manifest, the conventional source tree,
/// and the default Maven Central repository.
pub async fn init(
    project: &Arc<Project>,
    host: &Arc<ExtensionHost>,
    name: &str,
    group: &str,
) -> Result<()> {
    if project.manifest_exists() {
        anyhow::bail!("a project already exists here ({})", paths::MANIFEST_FILE);
    }

    project.set_identity(name, group);

    let main = paths::src_dir(project.root()).join("main");
    tokio::fs::create_dir_all(main.join("resources")).await?;
    let mut package_dir = main.join("java");
    for segment in group.split('.').filter(|s| !s.is_empty()) {
        package_dir.push(segment);
    }
    package_dir.push(name);
    tokio::fs::create_dir_all(&package_dir).await?;

    // The manifest must exist before a repo can be recorded.
    project.save().await?;

    let central = Url::parse(MAVEN_CENTRAL).context("default repository URL")?;
    project.add_repo(central, host).await?;

    println!("Created project '{name}' in {}", project.root().display());
    Ok(())
}
