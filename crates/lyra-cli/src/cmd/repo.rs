//! Repo command

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;

use lyra_core::{ExtensionHost, Project};

/// Register an artifact repository for the current session.
pub async fn repo(project: &Arc<Project>, host: &Arc<ExtensionHost>, url: &str) -> Result<()> {
    let url = Url::parse(url).with_context(|| format!("invalid repository URL '{url}'"))?;
    project.add_repo(url.clone(), host).await?;
    println!("Registered repository {url}");
    Ok(())
}
