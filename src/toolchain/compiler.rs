//! C compiler and linker invocation.

use std::fs;
use std::path::{Path, PathBuf};

use super::shell::{check, execute_program, CommandOptions};
use crate::error::Result;

/// Compiles sources to objects and links objects into loadable libraries.
pub trait Compiler {
    /// Compile `source` into `object`, returning the object path.
    fn compile(
        &self,
        source: &Path,
        object: &Path,
        include_dirs: &[PathBuf],
        flags: &[String],
    ) -> Result<PathBuf>;

    /// Link `objects` into the shared library `lib`, returning its path.
    fn link(&self, objects: &[PathBuf], lib: &Path, flags: &[String]) -> Result<PathBuf>;
}

/// A `cc`-compatible compiler driver.
#[derive(Debug, Clone)]
pub struct CcCompiler {
    program: String,
    cwd: Option<PathBuf>,
}

impl Default for CcCompiler {
    fn default() -> Self {
        Self::new(std::env::var("CC").unwrap_or_else(|_| "cc".to_string()))
    }
}

impl CcCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            cwd: None,
        }
    }

    /// Run the compiler from `dir`.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for compiling one source file.
    pub fn compile_args(
        source: &Path,
        object: &Path,
        include_dirs: &[PathBuf],
        flags: &[String],
    ) -> Vec<String> {
        let mut args = vec!["-c".to_string(), "-fPIC".to_string()];
        args.extend(include_dirs.iter().map(|d| format!("-I{}", d.display())));
        args.extend(flags.iter().cloned());
        args.push("-o".to_string());
        args.push(object.display().to_string());
        args.push(source.display().to_string());
        args
    }

    /// Arguments for linking a shared library.
    pub fn link_args(objects: &[PathBuf], lib: &Path, flags: &[String]) -> Vec<String> {
        let shared = if cfg!(target_os = "macos") {
            "-dynamiclib"
        } else {
            "-shared"
        };
        let mut args = vec![shared.to_string(), "-o".to_string(), lib.display().to_string()];
        args.extend(objects.iter().map(|o| o.display().to_string()));
        args.extend(flags.iter().cloned());
        args
    }

    fn run(&self, args: Vec<String>) -> Result<()> {
        let options = CommandOptions {
            cwd: self.cwd.clone(),
            ..Default::default()
        };
        let command_line = format!("{} {}", self.program, args.join(" "));
        let result = execute_program(&self.program, &args, &options)?;
        check(result, &command_line)?;
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl Compiler for CcCompiler {
    fn compile(
        &self,
        source: &Path,
        object: &Path,
        include_dirs: &[PathBuf],
        flags: &[String],
    ) -> Result<PathBuf> {
        ensure_parent(object)?;
        tracing::info!("Compiling {}", source.display());
        self.run(Self::compile_args(source, object, include_dirs, flags))?;
        Ok(object.to_path_buf())
    }

    fn link(&self, objects: &[PathBuf], lib: &Path, flags: &[String]) -> Result<PathBuf> {
        ensure_parent(lib)?;
        tracing::info!("Linking {}", lib.display());
        self.run(Self::link_args(objects, lib, flags))?;
        Ok(lib.to_path_buf())
    }
}
