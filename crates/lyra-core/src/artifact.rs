//! The Artifact value entity: one resolvable dependency.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::registry::resolver::ResolverRegistry;

/// A named, versioned dependency with one or more resolvable locations.
///
/// Identity is `(name, group)`: two artifacts are the same iff both match,
/// regardless of version. The nested `dependencies` list is informational
/// only and is never expanded automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "Group", default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    #[serde(rename = "Version", default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// URI of the main binary, resolved at add-time.
    #[serde(rename = "Main", default, skip_serializing_if = "String::is_empty")]
    pub main: String,

    #[serde(rename = "Sources", default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,

    #[serde(rename = "Docs", default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,

    /// Marks the artifact for inclusion when packaging a fat jar.
    #[serde(rename = "Include", default, skip_serializing_if = "std::ops::Not::not")]
    pub include: bool,

    #[serde(rename = "Dependencies", default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Artifact>,
}

impl Artifact {
    /// Two artifacts are the same when name and group match; version is
    /// deliberately ignored so a later `get` replaces the stored entry.
    pub fn same_as(&self, other: &Artifact) -> bool {
        self.name == other.name && self.group == other.group
    }

    /// Resolve the main URI to a local filesystem path.
    pub async fn resolve(&self, resolvers: &ResolverRegistry) -> Result<PathBuf, ResolveError> {
        resolvers.resolve_to_path(&self.main).await
    }

    /// Resolve the sources URI, or `None` when the artifact has none.
    pub async fn resolve_sources(
        &self,
        resolvers: &ResolverRegistry,
    ) -> Result<Option<PathBuf>, ResolveError> {
        match &self.sources {
            Some(uri) => Ok(Some(resolvers.resolve_to_path(uri).await?)),
            None => Ok(None),
        }
    }

    /// Resolve the docs URI, or `None` when the artifact has none.
    pub async fn resolve_docs(
        &self,
        resolvers: &ResolverRegistry,
    ) -> Result<Option<PathBuf>, ResolveError> {
        match &self.docs {
            Some(uri) => Ok(Some(resolvers.resolve_to_path(uri).await?)),
            None => Ok(None),
        }
    }
}
