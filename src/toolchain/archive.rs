//! Distribution archives.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder as TarBuilder;

use crate::error::Result;

/// Packs files into a distribution archive.
pub trait Archiver {
    /// Write `files` (relative to `root`) into the archive `dest`.
    fn create_archive(&self, dest: &Path, root: &Path, files: &[PathBuf]) -> Result<PathBuf>;

    /// File extension of archives this archiver writes.
    fn extension(&self) -> &str;
}

/// Gzip-compressed tarballs.
#[derive(Debug, Clone, Default)]
pub struct TarGzArchiver;

impl Archiver for TarGzArchiver {
    fn create_archive(&self, dest: &Path, root: &Path, files: &[PathBuf]) -> Result<PathBuf> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let out = File::create(dest)?;
        let mut builder = TarBuilder::new(GzEncoder::new(out, Compression::default()));

        let mut files = files.to_vec();
        files.sort();
        for rel in &files {
            let name = rel.to_string_lossy().replace('\\', "/");
            builder
                .append_path_with_name(root.join(rel), &name)
                .with_context(|| format!("Failed to add {} to archive", name))?;
        }

        let encoder = builder
            .into_inner()
            .with_context(|| "Failed to finalize tar builder")?;
        encoder.finish()?;

        tracing::info!("Created {}", dest.display());
        Ok(dest.to_path_buf())
    }

    fn extension(&self) -> &str {
        "tar.gz"
    }
}
