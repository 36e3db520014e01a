//! External tools used by the standard actions.
//!
//! - [`shell`] - Running commands and programs
//! - [`compiler`] - Compiling and linking C sources
//! - [`archive`] - Writing distribution archives

pub mod archive;
pub mod compiler;
pub mod shell;

pub use archive::{Archiver, TarGzArchiver};
pub use compiler::{CcCompiler, Compiler};
pub use shell::{execute, execute_program, CommandOptions, CommandResult};

/// The collaborators a builder calls out to.
pub struct Toolchain {
    pub compiler: Box<dyn Compiler>,
    pub archiver: Box<dyn Archiver>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: Box::new(CcCompiler::default()),
            archiver: Box::new(TarGzArchiver),
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("archive_extension", &self.archiver.extension())
            .finish_non_exhaustive()
    }
}
