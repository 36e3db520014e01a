//! Persisted builder configuration.
//!
//! The `configure` action writes a checkpoint of every property value and
//! free-form argument to `_build/config.yml`. Later invocations resume
//! from it instead of starting over from the defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::properties::{Properties, PropertyValue};

/// Directory holding build bookkeeping, relative to the distribution root.
pub const BUILD_DIR: &str = "_build";

/// A snapshot of a builder's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Schema version for migration.
    pub version: u32,

    /// When the checkpoint was written.
    pub saved_at: DateTime<Utc>,

    /// Build classes in precedence order.
    pub classes: Vec<String>,

    /// Registered property values.
    pub properties: BTreeMap<String, PropertyValue>,

    /// Free-form arguments.
    #[serde(default)]
    pub args: BTreeMap<String, PropertyValue>,
}

impl Checkpoint {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Snapshot `props`.
    pub fn capture(classes: Vec<String>, props: &Properties) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            saved_at: Utc::now(),
            classes,
            properties: props.values().clone(),
            args: props.args().clone(),
        }
    }

    /// The checkpoint file for a distribution rooted at `base_dir`.
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(BUILD_DIR).join("config.yml")
    }

    /// Whether a checkpoint exists for `base_dir`.
    pub fn exists(base_dir: &Path) -> bool {
        Self::path(base_dir).is_file()
    }

    /// Load the checkpoint, if one has been written.
    pub fn load(base_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let checkpoint: Self =
            serde_yaml::from_str(&content).map_err(|e| BuildError::ConfigParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if checkpoint.version > Self::CURRENT_VERSION {
            return Err(BuildError::ConfigParseError {
                path,
                message: format!(
                    "checkpoint version {} is newer than supported version {}",
                    checkpoint.version,
                    Self::CURRENT_VERSION
                ),
            });
        }
        Ok(Some(checkpoint))
    }

    /// Save the checkpoint using write-to-temp-then-rename.
    pub fn save(&self, base_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(base_dir);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content =
            serde_yaml::to_string(self).map_err(|e| BuildError::ConfigValidationError {
                message: format!("Failed to serialize checkpoint: {}", e),
            })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Wrote checkpoint {}", path.display());
        Ok(path)
    }

    /// Property values and arguments as one explicit-value map.
    pub fn into_values(self) -> BTreeMap<String, PropertyValue> {
        let mut values = self.args;
        values.extend(self.properties);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyRegistry;
    use tempfile::TempDir;

    fn props() -> Properties {
        let mut registry = PropertyRegistry::new();
        registry.add_class("core");
        registry.add_property("core", "verbose", false).unwrap();
        registry.add_property("core", "dist_name", "Foo").unwrap();
        registry
            .add_property("core", "include_dirs", vec!["inc".to_string()])
            .unwrap();
        let mut props = Properties::new(&registry, BTreeMap::new()).unwrap();
        props
            .merge_args(vec![
                ("verbose".to_string(), PropertyValue::Flag(true)),
                ("install_requires".to_string(), PropertyValue::from("Bar=1.0")),
            ])
            .unwrap();
        props
    }

    #[test]
    fn missing_checkpoint_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(!Checkpoint::exists(temp.path()));
        assert_eq!(Checkpoint::load(temp.path()).unwrap(), None);
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let checkpoint = Checkpoint::capture(vec!["core".into(), "unix".into()], &props());
        let path = checkpoint.save(temp.path()).unwrap();

        assert_eq!(path, temp.path().join("_build/config.yml"));
        assert!(!path.with_extension("yml.tmp").exists());

        let loaded = Checkpoint::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.properties["verbose"], PropertyValue::Flag(true));
        assert_eq!(
            loaded.args["install_requires"],
            PropertyValue::from("Bar=1.0")
        );
    }

    #[test]
    fn into_values_merges_args_and_properties() {
        let values = Checkpoint::capture(vec![], &props()).into_values();
        assert_eq!(values["dist_name"], PropertyValue::from("Foo"));
        assert!(values.contains_key("install_requires"));
    }

    #[test]
    fn corrupt_checkpoint_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(BUILD_DIR)).unwrap();
        fs::write(Checkpoint::path(temp.path()), "version: [unclosed").unwrap();

        assert!(matches!(
            Checkpoint::load(temp.path()),
            Err(BuildError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn newer_schema_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut checkpoint = Checkpoint::capture(vec![], &props());
        checkpoint.version = Checkpoint::CURRENT_VERSION + 1;
        checkpoint.save(temp.path()).unwrap();

        assert!(Checkpoint::load(temp.path()).is_err());
    }
}
