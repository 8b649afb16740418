//! Application packaging plugin.
//!
//! Watches classes as they are packaged and records the entry point in the
//! archive manifest. A module with more than one `public static void
//! main(String[])` class is rejected; the manifest store's presence check is
//! what enforces the "exactly one" policy.

use std::sync::Arc;

use thiserror::Error;

use lyra_core::ExtensionHost;

const MAIN_CLASS: &str = "Main-Class";

#[derive(Debug, Error)]
#[error("module {module} has too many main method declarations - only one allowed")]
pub struct DuplicateEntryPoint {
    pub module: String,
}

pub fn register(host: &Arc<ExtensionHost>) {
    host.build.package_class(|build, jar, class| {
        if !class.has_main_method() {
            return Ok(());
        }
        if build.has_manifest_entry(MAIN_CLASS) {
            let module = jar
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(DuplicateEntryPoint { module }.into());
        }
        build.add_manifest_entry(MAIN_CLASS, &class.name().replace('/', "."));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::build::{ClassFile, Jar};

    /// Bytes of a minimal class file the decoder accepts.
    fn class_bytes(name: &str, with_main: bool) -> Vec<u8> {
        fn utf8(s: &str) -> Vec<u8> {
            let mut v = vec![1u8];
            v.extend((s.len() as u16).to_be_bytes());
            v.extend(s.as_bytes());
            v
        }
        fn class(index: u16) -> Vec<u8> {
            let mut v = vec![7u8];
            v.extend(index.to_be_bytes());
            v
        }

        let pool = [
            utf8(name),
            class(1),
            utf8("java/lang/Object"),
            class(3),
            utf8("main"),
            utf8("([Ljava/lang/String;)V"),
        ];

        let mut out = Vec::new();
        out.extend(0xCAFE_BABEu32.to_be_bytes());
        out.extend([0, 0, 0, 52]); // minor, major
        out.extend((pool.len() as u16 + 1).to_be_bytes());
        for entry in &pool {
            out.extend(entry);
        }
        out.extend(0x0021u16.to_be_bytes()); // access flags
        out.extend(2u16.to_be_bytes()); // this_class
        out.extend(4u16.to_be_bytes()); // super_class
        out.extend(0u16.to_be_bytes()); // interfaces
        out.extend(0u16.to_be_bytes()); // fields
        if with_main {
            out.extend(1u16.to_be_bytes());
            out.extend(0x0009u16.to_be_bytes()); // public static
            out.extend(5u16.to_be_bytes()); // "main"
            out.extend(6u16.to_be_bytes()); // descriptor
            out.extend(0u16.to_be_bytes()); // attributes
        } else {
            out.extend(0u16.to_be_bytes());
        }
        out.extend(0u16.to_be_bytes()); // class attributes
        out
    }

    #[tokio::test]
    async fn the_first_entry_point_lands_in_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let jar = Jar::create(&dir.path().join("main.jar")).await.unwrap();
        let host = ExtensionHost::new();
        register(&host);

        let mut app = ClassFile::parse(&class_bytes("com/example/App", true)).unwrap();
        let mut util = ClassFile::parse(&class_bytes("com/example/Util", false)).unwrap();

        let hooks = host.build.package_class_hooks();
        assert_eq!(hooks.len(), 1);
        hooks[0](&host.build, &jar, &mut util).unwrap();
        hooks[0](&host.build, &jar, &mut app).unwrap();

        assert_eq!(
            host.build.manifest_entries(),
            vec![("Main-Class".to_string(), "com.example.App".to_string())]
        );
    }

    #[tokio::test]
    async fn a_second_entry_point_names_the_module() {
        let dir = tempfile::tempdir().unwrap();
        let jar = Jar::create(&dir.path().join("main.jar")).await.unwrap();
        let host = ExtensionHost::new();
        register(&host);

        let mut first = ClassFile::parse(&class_bytes("com/example/App", true)).unwrap();
        let mut second = ClassFile::parse(&class_bytes("com/example/Other", true)).unwrap();

        let hooks = host.build.package_class_hooks();
        hooks[0](&host.build, &jar, &mut first).unwrap();
        let err = hooks[0](&host.build, &jar, &mut second).unwrap_err();
        assert_eq!(
            err.to_string(),
            "module main has too many main method declarations - only one allowed"
        );
    }
}
