//! The extension host: every registry a plugin can touch, gathered on one
//! explicitly constructed object.
//!
//! There are no package-level globals. The host is built once at process
//! start, handed to plugins for registration, and then shared (read-mostly)
//! with the build. Tests construct isolated hosts per case.

use std::sync::Arc;

use crate::maven::MavenParser;
use crate::registry::RepoAcceptors;
use crate::registry::command::CommandRegistry;
use crate::registry::hooks::BuildRegistry;
use crate::registry::parser::ParserRegistry;
use crate::registry::resolver::{HttpResolver, ResolverRegistry};
use crate::toolchain::JavaToolchain;

/// Process-wide extension surface: parsers, resolvers, repo acceptors, build
/// hooks, commands, and the toolchain path holder.
#[derive(Debug, Default)]
pub struct ExtensionHost {
    pub parsers: ParserRegistry,
    pub resolvers: ResolverRegistry,
    pub repo_acceptors: RepoAcceptors,
    pub build: BuildRegistry,
    pub commands: CommandRegistry,
    pub toolchain: JavaToolchain,
    client: reqwest::Client,
}

impl ExtensionHost {
    /// An empty host with nothing registered. Primarily for tests and
    /// embedders that wire their own stack.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A host with the built-in extensions registered: the HTTP/HTTPS cache
    /// resolver, the Maven coordinate parser, and the default manifest
    /// entry.
    ///
    /// # Errors
    ///
    /// Fails when the user cache directory cannot be determined.
    pub fn with_defaults() -> anyhow::Result<Arc<Self>> {
        let cache = crate::paths::try_cache_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine cache directory; set LYRA_CACHE"))?;
        Ok(Self::with_defaults_at(cache))
    }

    /// Like [`with_defaults`](Self::with_defaults) with an explicit download
    /// cache location.
    pub fn with_defaults_at(cache: std::path::PathBuf) -> Arc<Self> {
        let host = Self::default();
        let http = Arc::new(HttpResolver::new(cache, host.client.clone()));
        host.resolvers.register("http", http.clone());
        host.resolvers.register("https", http);
        host.parsers
            .register(Arc::new(MavenParser::new(host.client.clone())));
        host.build.add_manifest_entry("Created-By", "Lyra");

        Arc::new(host)
    }

    /// Shared HTTP client for network operations.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
