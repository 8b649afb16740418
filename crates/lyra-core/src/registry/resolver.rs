//! Scheme-keyed resolver dispatch and recursive URI resolution.
//!
//! A resolver advances a URI one protocol hop toward a local file. Layered
//! protocols work by chaining: a custom scheme may resolve to an HTTPS URI,
//! which resolves to a local cache file. `file` is the terminal scheme.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Url;

use crate::error::ResolveError;
use crate::io::download;

/// Hop budget for a single resolve chain. Resolvers that form a scheme cycle
/// exhaust it and surface [`ResolveError::CycleDetected`] instead of
/// recursing forever.
const MAX_RESOLVE_HOPS: usize = 8;

/// A function that advances a URI one protocol hop toward a local file,
/// keyed by URI scheme.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve the URI to a new URI string, one hop closer to a `file://`
    /// location.
    async fn resolve(&self, uri: &Url) -> anyhow::Result<String>;
}

/// Maps a URI scheme to its registered resolver.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: RwLock<HashMap<String, Arc<dyn Resolver>>>,
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<String> =
            self.resolvers.read().unwrap().keys().cloned().collect();
        schemes.sort();
        f.debug_struct("ResolverRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

impl ResolverRegistry {
    /// Associate a URI scheme with a resolver. Last registration for a
    /// scheme wins.
    pub fn register(&self, scheme: &str, resolver: Arc<dyn Resolver>) {
        self.resolvers
            .write()
            .unwrap()
            .insert(scheme.to_string(), resolver);
    }

    fn get(&self, scheme: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.read().unwrap().get(scheme).cloned()
    }

    /// Resolve a URI to a local filesystem path, following resolver hops
    /// until the terminal `file` scheme is reached.
    pub async fn resolve_to_path(&self, uri: &str) -> Result<PathBuf, ResolveError> {
        let mut current = uri.to_string();
        for _ in 0..MAX_RESOLVE_HOPS {
            let parsed = Url::parse(&current).map_err(|e| ResolveError::InvalidUri {
                uri: current.clone(),
                reason: e.to_string(),
            })?;

            if parsed.scheme() == "file" {
                return Ok(local_path(&parsed));
            }

            let scheme = parsed.scheme().to_string();
            let resolver = self
                .get(&scheme)
                .ok_or_else(|| ResolveError::UnregisteredScheme(scheme.clone()))?;

            tracing::debug!(uri = %current, scheme = %scheme, "resolving");
            current = resolver
                .resolve(&parsed)
                .await
                .map_err(|source| ResolveError::Resolver { scheme, source })?;
        }
        Err(ResolveError::CycleDetected {
            uri: uri.to_string(),
            hops: MAX_RESOLVE_HOPS,
        })
    }
}

/// Extract a cleaned local path from a terminal `file://` URI.
///
/// Certain URI encodings of drive-letter paths produce a spurious leading
/// separator (`file:///C:/x` parses to the path `/C:/x`); strip it.
fn local_path(uri: &Url) -> PathBuf {
    let path = uri.path();
    if let Some(stripped) = path.strip_prefix('/') {
        let mut chars = stripped.chars();
        if let (Some(letter), Some(':')) = (chars.next(), chars.next()) {
            if letter.is_ascii_alphabetic() {
                return PathBuf::from(stripped);
            }
        }
    }
    PathBuf::from(path)
}

/// Built-in resolver for `http`/`https`: downloads the resource into the
/// cache (idempotently) and hands back a `file://` URI.
pub struct HttpResolver {
    cache: PathBuf,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResolver").field("cache", &self.cache).finish()
    }
}

impl HttpResolver {
    pub fn new(cache: PathBuf, client: reqwest::Client) -> Self {
        Self { cache, client }
    }

    fn local_path_for(&self, uri: &Url) -> PathBuf {
        let host = uri.host_str().unwrap_or("unknown");
        let path = uri.path().trim_matches('/');
        let mut local = self.cache.join("libs").join("http").join(host);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            local = local.join(segment);
        }
        local
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, uri: &Url) -> anyhow::Result<String> {
        let local = self.local_path_for(uri);
        download(&self.client, &local, uri.as_str()).await?;
        Ok(format!("file://{}", local.display()))
    }
}
