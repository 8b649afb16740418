//! Classpath command

use std::sync::Arc;

use anyhow::Result;

use lyra_core::{ExtensionHost, Project, paths};

/// Resolve every stored artifact and print the joined classpath.
pub async fn classpath(project: &Arc<Project>, host: &Arc<ExtensionHost>) -> Result<()> {
    let entries = project.classpath(host).await?;
    println!("{}", paths::join_classpath(&entries));
    Ok(())
}
