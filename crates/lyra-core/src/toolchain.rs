//! External JVM toolchain invocation.
//!
//! The toolchain path is set at most once (typically by a JDK-provisioning
//! plugin); when unset, `javac`/`java` are located on `$PATH`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::process::Command;

use crate::error::ToolchainError;
use crate::paths::join_classpath;

fn exe(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Holder for the JDK `bin` directory plus compile/run entry points.
#[derive(Debug, Default)]
pub struct JavaToolchain {
    path: Mutex<Option<PathBuf>>,
}

/// Options for a `javac` invocation.
#[derive(Debug, Default)]
pub struct CompileOptions {
    pub classpath: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub out_dir: PathBuf,
}

/// Options for a `java` invocation.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub classpath: Vec<PathBuf>,
    pub jar: Option<PathBuf>,
    pub main_class: Option<String>,
    pub args: Vec<String>,
}

impl JavaToolchain {
    /// Set the toolchain location. Fails if another plugin already set it.
    /// A path not ending in `bin` gets `bin` appended.
    pub fn set_path(&self, java_path: &Path) -> Result<(), ToolchainError> {
        let mut path = self.path.lock().unwrap();
        if path.is_some() {
            return Err(ToolchainError::AlreadySet);
        }
        let java_path = if java_path.file_name().is_some_and(|n| n == "bin") {
            java_path.to_path_buf()
        } else {
            java_path.join("bin")
        };
        *path = Some(java_path);
        Ok(())
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.path.lock().unwrap().clone()
    }

    fn tool(&self, name: &str) -> Result<PathBuf, ToolchainError> {
        match self.path() {
            Some(base) => Ok(base.join(exe(name))),
            None => which::which(exe(name)).map_err(|_| ToolchainError::NotFound {
                tool: name.to_string(),
            }),
        }
    }

    /// True when both `java` and `javac` are reachable.
    pub fn is_installed(&self) -> bool {
        let check = |name: &str| self.tool(name).map(|p| p.exists()).unwrap_or(false);
        check("java") && check("javac")
    }

    /// Invoke `javac` with the given classpath and sources, writing classes
    /// to `out_dir`. Diagnostics pass through to the parent's stdio.
    pub async fn compile(&self, options: CompileOptions) -> Result<(), ToolchainError> {
        let javac = self.tool("javac")?;
        tokio::fs::create_dir_all(&options.out_dir).await?;

        let mut cmd = Command::new(&javac);
        cmd.arg("-d").arg(&options.out_dir);
        if !options.classpath.is_empty() {
            cmd.arg("-cp").arg(join_classpath(&options.classpath));
        }
        cmd.args(["-encoding", "utf8"]);
        cmd.args(&options.sources);

        tracing::debug!(javac = %javac.display(), sources = options.sources.len(), "compiling");
        let status = cmd.status().await?;
        if !status.success() {
            return Err(ToolchainError::Exit {
                tool: "javac".to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    /// Invoke `java` against a jar or a main class.
    pub async fn run(&self, options: RunOptions) -> Result<(), ToolchainError> {
        let java = self.tool("java")?;

        let mut cmd = Command::new(&java);
        if !options.classpath.is_empty() {
            cmd.arg("-cp").arg(join_classpath(&options.classpath));
        }
        if let Some(jar) = &options.jar {
            cmd.arg("-jar").arg(jar);
        }
        if let Some(main_class) = &options.main_class {
            cmd.arg(main_class);
        }
        cmd.args(&options.args);

        let status = cmd.status().await?;
        if !status.success() {
            return Err(ToolchainError::Exit {
                tool: "java".to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}
