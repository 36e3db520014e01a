//! Locating installed dependencies and their versions.
//!
//! Versions are discovered without running any dependency code: the
//! [`SearchPathInspector`] finds a dependency's main file on a set of
//! search paths and reads its declared version statically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static RE_VERSION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?(?:our\s+|let\s+|const\s+|static\s+)?\$?(?:[A-Za-z_][\w:]*::)?(?i:version)\s*(?::\s*&?\w+\s*)?=\s*(?:qv\(\s*)?['"]?v?([0-9][0-9._]*)"#,
    )
    .expect("valid version declaration regex")
});

/// The result of looking up a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleLookup {
    /// Whether the dependency was found at all.
    pub found: bool,
    /// Its declared version, if any.
    pub version: Option<String>,
}

impl ModuleLookup {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(version: Option<String>) -> Self {
        Self {
            found: true,
            version,
        }
    }
}

/// Resolves dependency names to installed versions.
pub trait ModuleInspector {
    /// Look up `module` without executing it.
    fn resolve(&self, module: &str) -> ModuleLookup;
}

/// Extract the first declared version from source text.
///
/// Recognizes assignments such as `VERSION = '1.2'`,
/// `our $VERSION = "1.2_01";` and `version = "0.4"`.
pub fn extract_version(content: &str) -> Option<String> {
    RE_VERSION_DECL
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', '_']).to_string())
}

/// Finds dependencies as files under a list of search paths.
///
/// `Foo::Bar` maps to `Foo/Bar.<ext>` for each configured extension.
#[derive(Debug, Clone)]
pub struct SearchPathInspector {
    search_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl SearchPathInspector {
    /// Default file extensions probed for each dependency.
    pub const DEFAULT_EXTENSIONS: &'static [&'static str] = &["pm", "toml", "rs"];

    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            extensions: Self::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }

    /// Replace the probed extensions.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Search paths from the `MODBUILD_PATH` environment variable.
    pub fn from_env() -> Self {
        let paths = std::env::var_os("MODBUILD_PATH")
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default();
        Self::new(paths)
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the file that provides `module`.
    pub fn find(&self, module: &str) -> Option<PathBuf> {
        let relative: PathBuf = module.split("::").collect();
        self.search_paths.iter().find_map(|dir| {
            self.extensions.iter().find_map(|ext| {
                let candidate = dir.join(&relative).with_extension(ext);
                candidate.is_file().then_some(candidate)
            })
        })
    }
}

impl ModuleInspector for SearchPathInspector {
    fn resolve(&self, module: &str) -> ModuleLookup {
        let Some(path) = self.find(module) else {
            return ModuleLookup::not_found();
        };
        tracing::debug!("Found {} at {}", module, path.display());
        ModuleLookup::found(read_version(&path))
    }
}

fn read_version(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    extract_version(&content)
}

/// Dependencies already known to the running engine.
///
/// A resident marker short-circuits static inspection.
#[derive(Debug, Clone, Default)]
pub struct ResidentModules {
    modules: BTreeMap<String, Option<String>>,
}

impl ResidentModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resident dependency and its version.
    pub fn insert(&mut self, module: impl Into<String>, version: Option<String>) {
        self.modules.insert(module.into(), version);
    }

    /// The version marker of a resident dependency.
    ///
    /// `None` when not resident; `Some(None)` when resident without a version.
    pub fn get(&self, module: &str) -> Option<Option<&str>> {
        self.modules.get(module).map(|v| v.as_deref())
    }
}

/// A name that always resolves to the running engine's own version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeIdentity {
    pub name: String,
    pub version: String,
}

impl RuntimeIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The engine itself.
    pub fn engine() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
