//! Command modules - one file per CLI command

pub mod build;
pub mod classpath;
pub mod get;
pub mod init;
pub mod repo;
pub mod run;
