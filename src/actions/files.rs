//! File helpers shared by the standard actions.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;
use crate::freshness::up_to_date;

/// Regular files under `root`, sorted by path.
///
/// A missing `root` yields nothing. `root` may itself be a file.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Files under `root` whose name ends in `.<ext>`, sorted by path.
pub fn collect_files_with_extension(root: &Path, ext: &str) -> Vec<PathBuf> {
    collect_files(root)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|x| x == ext))
        .collect()
}

/// Copy `from` to `to` unless `to` is already up to date.
///
/// Returns whether a copy was made.
pub fn copy_if_modified(from: &Path, to: &Path) -> Result<bool> {
    if up_to_date(from, to) {
        return Ok(false);
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    // A read-only staged copy would make fs::copy fail.
    if to.exists() {
        fs::remove_file(to)?;
    }
    fs::copy(from, to)?;
    tracing::debug!("{} -> {}", from.display(), to.display());
    Ok(true)
}

/// Copy every file under `from` to the same relative path under `to`.
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for file in collect_files(from) {
        let rel = file.strip_prefix(from).unwrap_or(&file);
        let dest = if rel.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(rel)
        };
        if copy_if_modified(&file, &dest)? {
            copied += 1;
        }
    }
    Ok(copied)
}

/// Remove a file or directory tree if present.
///
/// Returns whether anything was removed.
pub fn remove_path(path: &Path) -> Result<bool> {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return Ok(false);
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    tracing::debug!("Removed {}", path.display());
    Ok(true)
}

/// Set unix permission bits given in octal text, e.g. `755`.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(bits) = u32::from_str_radix(mode, 8) else {
        tracing::warn!("Ignoring invalid file mode '{}'", mode);
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(bits))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: &str) -> Result<()> {
    Ok(())
}
