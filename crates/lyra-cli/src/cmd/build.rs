//! Build command

use std::sync::Arc;

use anyhow::Result;

use lyra_core::build::BuildOptions;
use lyra_core::{ExtensionHost, Project};

pub async fn build(
    project: &Arc<Project>,
    host: &Arc<ExtensionHost>,
    fat: bool,
    sources: bool,
) -> Result<()> {
    if !project.manifest_exists() {
        anyhow::bail!("no project in current directory");
    }
    lyra_core::build::build(
        Arc::clone(project),
        Arc::clone(host),
        BuildOptions { fat, sources },
    )
    .await?;
    Ok(())
}
