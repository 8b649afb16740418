//! lyra - a small build tool for JVM source trees

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lyra_core::registry::command::CommandContext;
use lyra_core::{ExtensionHost, Project};

mod cmd;
mod plugins;

#[derive(Parser)]
#[command(name = "lyra")]
#[command(author, version, about = "lyra - a small build tool for JVM source trees")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project in the current directory
    Init {
        /// Project name
        name: String,
        /// Group identifier, e.g. com.example
        #[arg(long, default_value = "")]
        group: String,
    },
    /// Fetch one or more artifacts and add them to the project
    Get {
        /// Artifact coordinates, e.g. com.example:widget:1.0
        #[arg(required = true)]
        coordinates: Vec<String>,
    },
    /// Register an artifact repository for this session
    Repo {
        /// Repository base URL
        url: String,
    },
    /// Compile and package every module under src/
    Build {
        /// Merge include-flagged artifacts into the module archives
        #[arg(long)]
        fat: bool,
        /// Also package <module>-sources.jar archives
        #[arg(long)]
        sources: bool,
    },
    /// Print the resolved classpath
    Classpath,
    /// Build, then run a module's archive
    Run {
        /// Module to run
        #[arg(long, default_value = "main")]
        module: String,
        /// Arguments passed to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// A command contributed by a plugin
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let host = ExtensionHost::with_defaults()?;
    plugins::register(&host);

    let root = std::env::current_dir()?;
    let project = Arc::new(Project::load(&root)?);

    match cli.command {
        Commands::Init { name, group } => cmd::init::init(&project, &host, &name, &group).await?,
        Commands::Get { coordinates } => cmd::get::get(&project, &host, coordinates).await?,
        Commands::Repo { url } => cmd::repo::repo(&project, &host, &url).await?,
        Commands::Build { fat, sources } => {
            cmd::build::build(&project, &host, fat, sources).await?
        }
        Commands::Classpath => cmd::classpath::classpath(&project, &host).await?,
        Commands::Run { module, args } => cmd::run::run(&project, &host, &module, args).await?,
        Commands::External(mut args) => {
            let name = args.remove(0);
            let ctx = CommandContext {
                project: Arc::clone(&project),
                host: Arc::clone(&host),
                args,
            };
            host.commands.dispatch(&name, ctx).await?;
        }
    }

    project.save().await
}
