//! Relocating baked-in install paths to a new prefix.

use std::path::{Path, PathBuf};

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strip `prefix` from the front of `path` when a word boundary follows it.
///
/// `/usr/local` strips from `/usr/local/lib` but not from `/usr/locale/lib`.
fn strip_at_word_boundary<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    let before = prefix.chars().next_back().is_some_and(is_word);
    let after = rest.chars().next().is_some_and(is_word);
    (before != after).then_some(rest)
}

fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        &path[..path.len().min(1)]
    } else {
        trimmed
    }
}

/// Relocate `path` from `source_prefix` to `new_prefix`.
///
/// - An empty `path` becomes `default_relpath` under `new_prefix`, or the
///   bare `new_prefix` when there is no default.
/// - A relative `path` is returned unchanged.
/// - When the prefixes are equal `path` is returned unchanged.
/// - Otherwise `source_prefix` is stripped from `path` and the remainder is
///   joined under `new_prefix`. If `path` does not start with
///   `source_prefix`, the default is used as for an empty path.
pub fn prefixify(
    path: &str,
    source_prefix: &str,
    new_prefix: &Path,
    default_relpath: Option<&Path>,
) -> PathBuf {
    let type_default = || match default_relpath {
        Some(rel) => new_prefix.join(rel),
        None => new_prefix.to_path_buf(),
    };

    if path.is_empty() {
        tracing::debug!("No path to prefixify, using default");
        return type_default();
    }
    if Path::new(path).is_relative() {
        tracing::debug!("{} is relative, leaving it alone", path);
        return PathBuf::from(path);
    }

    let source_prefix = trim_trailing_separators(source_prefix);
    if Path::new(source_prefix) == new_prefix {
        return PathBuf::from(path);
    }

    tracing::debug!("Prefixifying {} from {} to {}", path, source_prefix, new_prefix.display());
    match strip_at_word_boundary(path, source_prefix) {
        Some(rest) => {
            let rest = rest.trim_start_matches(['/', '\\']);
            if rest.is_empty() {
                new_prefix.to_path_buf()
            } else {
                new_prefix.join(rest)
            }
        }
        None => {
            tracing::debug!("Couldn't prefixify {}, using default", path);
            type_default()
        }
    }
}
