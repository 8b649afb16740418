//! Build-lifecycle hooks and the shared archive manifest store.
//!
//! Hooks run in registration order; the first error aborts the remainder of
//! that stage. The manifest store is last-writer-wins per field; uniqueness
//! policies ("exactly one Main-Class") are the caller's responsibility,
//! enforced via [`BuildRegistry::has_manifest_entry`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::Project;
use crate::build::class::ClassFile;
use crate::build::jar::Jar;

pub type PreCompileFn = dyn Fn(&Project) -> anyhow::Result<()> + Send + Sync;
pub type PrePackageFn = dyn Fn(&Project, &Jar) -> anyhow::Result<()> + Send + Sync;
pub type PackageClassFn =
    dyn Fn(&BuildRegistry, &Jar, &mut ClassFile) -> anyhow::Result<()> + Send + Sync;

/// Registry of build hooks plus the manifest key-value store, append-only
/// for the process lifetime.
#[derive(Default)]
pub struct BuildRegistry {
    pre_compile: RwLock<Vec<Arc<PreCompileFn>>>,
    pre_package: RwLock<Vec<Arc<PrePackageFn>>>,
    package_class: RwLock<Vec<Arc<PackageClassFn>>>,
    manifest: RwLock<BTreeMap<String, String>>,
}

impl std::fmt::Debug for BuildRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildRegistry")
            .field("pre_compile", &self.pre_compile.read().unwrap().len())
            .field("pre_package", &self.pre_package.read().unwrap().len())
            .field("package_class", &self.package_class.read().unwrap().len())
            .field("manifest", &*self.manifest.read().unwrap())
            .finish()
    }
}

impl BuildRegistry {
    /// Append a callback run once before any module compiles.
    pub fn pre_compile<F>(&self, hook: F)
    where
        F: Fn(&Project) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_compile.write().unwrap().push(Arc::new(hook));
    }

    /// Append a callback run against each freshly created jar sink before
    /// members are staged.
    pub fn pre_package_jar<F>(&self, hook: F)
    where
        F: Fn(&Project, &Jar) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_package.write().unwrap().push(Arc::new(hook));
    }

    /// Append a callback run for every decoded class file while packaging.
    /// Hooks may mutate the class; the mutated bytes are serialized back
    /// into the archive member.
    pub fn package_class<F>(&self, hook: F)
    where
        F: Fn(&BuildRegistry, &Jar, &mut ClassFile) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.package_class.write().unwrap().push(Arc::new(hook));
    }

    pub fn pre_compile_hooks(&self) -> Vec<Arc<PreCompileFn>> {
        self.pre_compile.read().unwrap().clone()
    }

    pub fn pre_package_hooks(&self) -> Vec<Arc<PrePackageFn>> {
        self.pre_package.read().unwrap().clone()
    }

    pub fn package_class_hooks(&self) -> Vec<Arc<PackageClassFn>> {
        self.package_class.read().unwrap().clone()
    }

    /// Set a manifest field. The last writer for a given field wins.
    pub fn add_manifest_entry(&self, field: &str, value: &str) {
        self.manifest
            .write()
            .unwrap()
            .insert(field.to_string(), value.to_string());
    }

    pub fn has_manifest_entry(&self, field: &str) -> bool {
        self.manifest.read().unwrap().contains_key(field)
    }

    /// All manifest entries in stable (sorted) order.
    pub fn manifest_entries(&self) -> Vec<(String, String)> {
        self.manifest
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_entries_are_last_writer_wins_and_sorted() {
        let registry = BuildRegistry::default();
        registry.add_manifest_entry("Main-Class", "com.example.Old");
        registry.add_manifest_entry("Created-By", "Lyra");
        registry.add_manifest_entry("Main-Class", "com.example.App");

        assert!(registry.has_manifest_entry("Main-Class"));
        assert!(!registry.has_manifest_entry("Class-Path"));
        assert_eq!(
            registry.manifest_entries(),
            vec![
                ("Created-By".to_string(), "Lyra".to_string()),
                ("Main-Class".to_string(), "com.example.App".to_string()),
            ]
        );
    }

    #[test]
    fn hooks_keep_registration_order() {
        let registry = BuildRegistry::default();
        registry.pre_compile(|_| Ok(()));
        registry.pre_compile(|_| Err(anyhow::anyhow!("second")));

        let hooks = registry.pre_compile_hooks();
        assert_eq!(hooks.len(), 2);
    }
}
