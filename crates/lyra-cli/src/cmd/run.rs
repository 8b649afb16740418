//! Run command

use std::sync::Arc;

use anyhow::Result;

use lyra_core::build::BuildOptions;
use lyra_core::toolchain::RunOptions;
use lyra_core::{ExtensionHost, Project, paths};

/// Build the project, then launch the module's archive with `java -jar`.
pub async fn run(
    project: &Arc<Project>,
    host: &Arc<ExtensionHost>,
    module: &str,
    args: Vec<String>,
) -> Result<()> {
    if !project.manifest_exists() {
        anyhow::bail!("no project in current directory");
    }

    lyra_core::build::build(
        Arc::clone(project),
        Arc::clone(host),
        BuildOptions::default(),
    )
    .await?;

    let jar = paths::module_jar_path(project.root(), module);
    if !jar.exists() {
        anyhow::bail!("module '{module}' produced no archive");
    }

    let classpath = project.classpath(host).await?;
    host.toolchain
        .run(RunOptions {
            classpath,
            jar: Some(jar),
            main_class: None,
            args,
        })
        .await?;
    Ok(())
}
