//! Ordered coordinate-parser registry.
//!
//! Parsers turn an ecosystem-specific coordinate string into an [`Artifact`]
//! and are tried in strict registration order for a single slug. Ordering is
//! significant: a narrow, fast-failing parser registered before a general
//! one prevents the fallback from ever running.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Url;

use crate::Artifact;
use crate::error::ParseError;

/// Turns a coordinate string into an [`Artifact`]. The project's repository
/// list is supplied so parsers can consult registered repositories.
#[async_trait]
pub trait CoordinateParser: Send + Sync {
    async fn parse(&self, slug: &str, repos: &[Url]) -> Result<Artifact, ParseError>;
}

/// Append-only list of parsers in registration order.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: RwLock<Vec<Arc<dyn CoordinateParser>>>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.parsers.read().unwrap().len();
        f.debug_struct("ParserRegistry").field("count", &count).finish()
    }
}

impl ParserRegistry {
    pub fn register(&self, parser: Arc<dyn CoordinateParser>) {
        self.parsers.write().unwrap().push(parser);
    }

    /// All parsers in registration order.
    pub fn all(&self) -> Vec<Arc<dyn CoordinateParser>> {
        self.parsers.read().unwrap().clone()
    }
}
