//! Modification-time staleness checks.
//!
//! [`up_to_date`] decides whether derived files need to be regenerated from
//! their sources. It drives the incremental steps of the standard actions:
//! copying into `blib`, compiling, linking and documentation rendering.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Something that can be viewed as a list of paths.
///
/// A single path coerces to a one-element list.
pub trait PathList {
    fn to_path_list(&self) -> Vec<PathBuf>;
}

impl PathList for Path {
    fn to_path_list(&self) -> Vec<PathBuf> {
        vec![self.to_path_buf()]
    }
}

impl PathList for PathBuf {
    fn to_path_list(&self) -> Vec<PathBuf> {
        vec![self.clone()]
    }
}

impl PathList for str {
    fn to_path_list(&self) -> Vec<PathBuf> {
        vec![PathBuf::from(self)]
    }
}

impl PathList for String {
    fn to_path_list(&self) -> Vec<PathBuf> {
        vec![PathBuf::from(self)]
    }
}

impl<T: AsRef<Path>> PathList for [T] {
    fn to_path_list(&self) -> Vec<PathBuf> {
        self.iter().map(|p| p.as_ref().to_path_buf()).collect()
    }
}

impl<T: AsRef<Path>> PathList for Vec<T> {
    fn to_path_list(&self) -> Vec<PathBuf> {
        self.as_slice().to_path_list()
    }
}

impl<T: AsRef<Path>, const N: usize> PathList for [T; N] {
    fn to_path_list(&self) -> Vec<PathBuf> {
        self.as_slice().to_path_list()
    }
}

impl<T: PathList + ?Sized> PathList for &T {
    fn to_path_list(&self) -> Vec<PathBuf> {
        (**self).to_path_list()
    }
}

/// Whether every derived path is at least as new as every source path.
///
/// Returns false as soon as a derived path is missing. Missing sources are
/// skipped with a warning. With no existing source, derived files are
/// considered current.
pub fn up_to_date<S, D>(sources: &S, derived: &D) -> bool
where
    S: PathList + ?Sized,
    D: PathList + ?Sized,
{
    let derived = derived.to_path_list();
    let mut derived_times = Vec::with_capacity(derived.len());
    for path in &derived {
        match mtime(path) {
            Some(t) => derived_times.push(t),
            None => return false,
        }
    }

    let mut newest_source: Option<SystemTime> = None;
    for path in sources.to_path_list() {
        match mtime(&path) {
            Some(t) => {
                if newest_source.is_none_or(|newest| t > newest) {
                    newest_source = Some(t);
                }
            }
            None => tracing::warn!("Can't find source file {}", path.display()),
        }
    }

    match newest_source {
        Some(newest) => derived_times.iter().all(|t| *t >= newest),
        None => true,
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}
