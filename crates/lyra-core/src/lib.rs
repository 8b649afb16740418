//! Core library for lyra - a small build tool for JVM source trees.
//!
//! # Overview
//!
//! lyra resolves external artifacts from pluggable repository/protocol
//! sources, compiles and packages source modules into jar archives, and
//! exposes an extension-point API so plugins can alter its behavior without
//! modifying the core.
//!
//! # Architecture
//!
//! - **Extension Host**: every registry (coordinate parsers, URI resolvers,
//!   build hooks, commands) lives on an explicitly constructed
//!   [`ExtensionHost`] that is passed around by `Arc`. Tests build isolated
//!   hosts instead of sharing process state.
//! - **Project aggregate**: [`Project`] owns the repo list, the artifact
//!   list, and the named task groups used for fire-and-forget concurrent
//!   work. All collection access goes through accessor methods over a single
//!   mutex.
//! - **Build orchestrator**: [`build`] walks `src/<module>/java`, decides
//!   staleness by newest modification time, invokes the external toolchain,
//!   and fans out packaging work per file.
//!
//! # Directory Layout
//!
//! ```text
//! lyra.json                   persisted project manifest
//! src/<module>/java/          sources
//! src/<module>/resources/     resources copied into the jar
//! build/output/<module>/      compiled classes
//! build/jar/<module>.jar      packaged archives
//! ```

pub mod artifact;
pub mod build;
pub mod error;
pub mod group;
pub mod host;
pub mod io;
pub mod maven;
pub mod paths;
pub mod project;
pub mod registry;
pub mod toolchain;

pub use artifact::Artifact;
pub use group::TaskGroup;
pub use host::ExtensionHost;
pub use project::Project;

/// User Agent string for network operations
pub const USER_AGENT: &str = concat!("lyra/", env!("CARGO_PKG_VERSION"));
