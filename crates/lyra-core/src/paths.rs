use std::path::{Path, PathBuf};

/// Name of the persisted project manifest at the project root.
pub const MANIFEST_FILE: &str = "lyra.json";

/// Separator used when joining classpath entries, matching the platform's
/// path-list convention.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// Returns the lyra cache directory, or None if the user's cache dir cannot
/// be resolved. `LYRA_CACHE` overrides the default location.
pub fn try_cache_dir() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("LYRA_CACHE") {
        return Some(PathBuf::from(val));
    }
    dirs::cache_dir().map(|c| c.join("lyra"))
}

/// Path to the project manifest under the given project root.
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Source root: `<root>/src`. One module per top-level entry.
pub fn src_dir(root: &Path) -> PathBuf {
    root.join("src")
}

/// Java sources for a module: `src/<module>/java`.
pub fn module_java_dir(root: &Path, module: &str) -> PathBuf {
    root.join("src").join(module).join("java")
}

/// Resources for a module: `src/<module>/resources`.
pub fn module_resources_dir(root: &Path, module: &str) -> PathBuf {
    root.join("src").join(module).join("resources")
}

/// Compiled classes for a module: `build/output/<module>`.
pub fn module_output_dir(root: &Path, module: &str) -> PathBuf {
    root.join("build").join("output").join(module)
}

/// Packaged archive for a module: `build/jar/<module>.jar`.
pub fn module_jar_path(root: &Path, module: &str) -> PathBuf {
    root.join("build").join("jar").join(format!("{module}.jar"))
}

/// Sources archive for a module: `build/jar/<module>-sources.jar`.
pub fn module_sources_jar_path(root: &Path, module: &str) -> PathBuf {
    root.join("build").join("jar").join(format!("{module}-sources.jar"))
}

/// Join classpath entries with the platform path-list separator.
pub fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(&PATH_LIST_SEPARATOR.to_string())
}
