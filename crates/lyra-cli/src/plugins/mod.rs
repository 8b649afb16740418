//! Built-in plugins, registered at process start.
//!
//! These consume the same extension surface an out-of-process plugin would;
//! nothing here has privileged access to the core.

use std::sync::Arc;

use lyra_core::ExtensionHost;

pub mod application;

/// Register every built-in plugin on the host.
pub fn register(host: &Arc<ExtensionHost>) {
    application::register(host);
}
