//! Error taxonomy for the lyra core.
//!
//! Every operation returns an error value; concurrent task groups aggregate
//! to "first error wins". Resolution failures for `sources`/`docs` URIs are
//! the one deliberately recoverable case and are handled at the call site.

use thiserror::Error;

/// Errors produced while resolving an artifact URI to a local file.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("no resolver registered for scheme: {0}")]
    UnregisteredScheme(String),

    #[error("resolver cycle detected while resolving '{uri}' (gave up after {hops} hops)")]
    CycleDetected { uri: String, hops: usize },

    #[error("resolver for scheme '{scheme}' failed: {source}")]
    Resolver {
        scheme: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors produced while turning a coordinate string into an Artifact.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed coordinate: {0}")]
    Malformed(String),

    #[error("artifact '{slug}' not found in any registered repository")]
    NotFound { slug: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors produced while loading or saving the project manifest.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the external JVM toolchain.
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("toolchain path has already been set by another plugin")]
    AlreadySet,

    #[error("toolchain binary '{tool}' not found")]
    NotFound { tool: String },

    #[error("{tool} exited with status {status}")]
    Exit { tool: String, status: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while decoding a class file.
#[derive(Error, Debug)]
pub enum ClassError {
    #[error("class file is truncated")]
    Truncated,

    #[error("bad class file magic: {0:#010x}")]
    BadMagic(u32),

    #[error("unknown constant pool tag: {0}")]
    UnknownTag(u8),

    #[error("constant pool index {0} does not point at a Utf8 entry")]
    BadIndex(u16),
}

/// Errors produced while downloading a remote resource.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by the build orchestrator and the packaging pipeline.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Class(#[from] ClassError),

    #[error("build hook failed: {0}")]
    Hook(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("build task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}
