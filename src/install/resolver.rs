//! Install destination resolution.
//!
//! Destinations are resolved with a fixed precedence, first match wins:
//!
//! 1. an explicit `install_path` entry for the type
//! 2. `install_base` joined with the type's base-relative path
//! 3. `prefix`, relocating the named install set with [`prefixify`]
//! 4. the named install set verbatim
//!
//! A `destdir` staging root is prepended afterwards by [`InstallConfig::install_map`].

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use super::paths::{
    default_install_base_relpaths, default_install_sets, default_original_prefix,
    default_prefix_relpaths, parse_set_key, InstallDirs, InstallType,
};
use super::prefixify::prefixify;
use crate::error::{BuildError, Result};
use crate::properties::Properties;

/// Everything needed to resolve install destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallConfig {
    pub installdirs: InstallDirs,
    pub install_path: BTreeMap<InstallType, PathBuf>,
    pub install_base: Option<PathBuf>,
    pub prefix: Option<PathBuf>,
    pub destdir: Option<PathBuf>,
    pub install_base_relpaths: BTreeMap<InstallType, PathBuf>,
    pub prefix_relpaths: BTreeMap<(InstallDirs, InstallType), PathBuf>,
    pub install_sets: BTreeMap<(InstallDirs, InstallType), PathBuf>,
    pub original_prefix: BTreeMap<InstallDirs, PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            installdirs: InstallDirs::default(),
            install_path: BTreeMap::new(),
            install_base: None,
            prefix: None,
            destdir: None,
            install_base_relpaths: default_install_base_relpaths(),
            prefix_relpaths: default_prefix_relpaths(),
            install_sets: default_install_sets(),
            original_prefix: default_original_prefix(),
        }
    }
}

impl InstallConfig {
    /// Build the configuration from builder properties.
    ///
    /// Map-valued properties overlay the built-in layouts. Keys that do not
    /// name an install type or set are ignored with a warning.
    pub fn from_properties(props: &Properties) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dirs) = props.text("installdirs") {
            config.installdirs = dirs
                .parse()
                .map_err(|message| BuildError::ConfigValidationError { message })?;
        }
        config.install_base = props.text("install_base").map(PathBuf::from);
        config.prefix = props.text("prefix").map(PathBuf::from);
        config.destdir = props.text("destdir").map(PathBuf::from);

        overlay(props, "install_path", &mut config.install_path, |k| k.parse().ok());
        overlay(
            props,
            "install_base_relpaths",
            &mut config.install_base_relpaths,
            |k| k.parse().ok(),
        );
        overlay(props, "prefix_relpaths", &mut config.prefix_relpaths, parse_set_key);
        overlay(props, "install_sets", &mut config.install_sets, parse_set_key);
        overlay(props, "original_prefix", &mut config.original_prefix, |k| {
            k.parse().ok()
        });

        Ok(config)
    }

    /// Where elements of `ty` are installed, before `destdir` is applied.
    pub fn install_destination(&self, ty: InstallType) -> Option<PathBuf> {
        if let Some(path) = self.install_path.get(&ty) {
            return Some(path.clone());
        }

        if let Some(base) = &self.install_base {
            return self.install_base_relpaths.get(&ty).map(|rel| base.join(rel));
        }

        let key = (self.installdirs, ty);
        if let Some(prefix) = &self.prefix {
            let path = self.install_sets.get(&key);
            if let Some(path) = path.filter(|p| p.is_relative()) {
                return Some(prefix.join(path));
            }

            let path = path.map(|p| p.to_string_lossy()).unwrap_or_default();
            let source = self
                .original_prefix
                .get(&self.installdirs)
                .map(|p| p.to_string_lossy())
                .unwrap_or_default();
            let default = self.prefix_relpaths.get(&key).map(PathBuf::as_path);
            return Some(prefixify(&path, &source, prefix, default));
        }

        self.install_sets.get(&key).cloned()
    }

    /// Pair each `blib/<type>` staging directory with its destination.
    ///
    /// Types without a destination are omitted; `destdir` is prepended to
    /// every destination.
    pub fn install_map(&self, blib: &Path) -> BTreeMap<PathBuf, PathBuf> {
        InstallType::ALL
            .into_iter()
            .filter_map(|ty| {
                let dest = self.install_destination(ty)?;
                let dest = match &self.destdir {
                    Some(destdir) => apply_destdir(destdir, &dest),
                    None => dest,
                };
                Some((blib.join(ty.as_str()), dest))
            })
            .collect()
    }
}

/// Prepend a staging root, dropping any root or volume prefix of `path`.
pub fn apply_destdir(destdir: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    destdir.join(relative)
}

fn overlay<K: Ord>(
    props: &Properties,
    name: &str,
    target: &mut BTreeMap<K, PathBuf>,
    parse_key: impl Fn(&str) -> Option<K>,
) {
    let Some(entries) = props.map(name) else {
        return;
    };
    for (key, value) in entries {
        match parse_key(key) {
            Some(k) => {
                target.insert(k, PathBuf::from(value));
            }
            None => tracing::warn!("Ignoring unknown key '{}' in {}", key, name),
        }
    }
}
