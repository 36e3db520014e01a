//! Configuration file discovery and loading.
//!
//! Property values come from the distribution's `modbuild.yml`, with
//! `modbuild.local.yml` overriding it key by key. Per-user default
//! arguments for each action come from the rc file.

use crate::error::{BuildError, Result};
use crate::properties::PropertyValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Distribution config file name.
pub const CONFIG_FILE: &str = "modbuild.yml";

/// Uncommitted local overrides.
pub const LOCAL_CONFIG_FILE: &str = "modbuild.local.yml";

/// Environment variable naming an alternative rc file.
pub const RC_ENV: &str = "MODBUILDRC";

/// Paths to configuration files in priority order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Distribution config: modbuild.yml
    pub project: Option<PathBuf>,

    /// Local overrides: modbuild.local.yml
    pub project_local: Option<PathBuf>,

    /// User rc file: $MODBUILDRC or ~/.modbuildrc.yml
    pub rc: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the distribution rooted at `base_dir`.
    pub fn discover(base_dir: &Path) -> Self {
        Self {
            project: existing(base_dir.join(CONFIG_FILE)),
            project_local: existing(base_dir.join(LOCAL_CONFIG_FILE)),
            rc: Self::find_rc(),
        }
    }

    fn find_rc() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(RC_ENV) {
            return existing(PathBuf::from(path));
        }
        existing(dirs::home_dir()?.join(".modbuildrc.yml"))
    }

    /// Existing property config files in merge order.
    pub fn property_files(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(&self.project_local).collect()
    }

    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Find the distribution root by walking up from `start`.
///
/// The root is the nearest directory containing `modbuild.yml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Load a config file as a raw YAML value.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Null);
    }
    serde_yaml::from_str(&content).map_err(|e| BuildError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read one property file into name/value pairs.
///
/// The file must be a mapping; hyphens in keys become underscores.
pub fn parse_properties(value: &serde_yaml::Value, path: &Path) -> Result<BTreeMap<String, PropertyValue>> {
    let mapping = match value {
        serde_yaml::Value::Null => return Ok(BTreeMap::new()),
        serde_yaml::Value::Mapping(mapping) => mapping,
        _ => {
            return Err(BuildError::ConfigValidationError {
                message: format!("{} must contain a mapping of property values", path.display()),
            })
        }
    };

    mapping
        .iter()
        .map(|(key, value)| {
            let key = key.as_str().ok_or_else(|| BuildError::ConfigValidationError {
                message: format!("{}: property names must be strings", path.display()),
            })?;
            Ok((key.replace('-', "_"), PropertyValue::from_yaml(value)))
        })
        .collect()
}

/// Load the distribution's property values, local overrides winning.
pub fn load_properties(base_dir: &Path) -> Result<BTreeMap<String, PropertyValue>> {
    let paths = ConfigPaths::discover(base_dir);
    let mut properties = BTreeMap::new();
    for path in paths.property_files() {
        tracing::debug!("Loading {}", path.display());
        let value = load_config_value(path)?;
        properties.extend(parse_properties(&value, path)?);
    }
    Ok(properties)
}

/// Default arguments per action from the user's rc file.
///
/// ```yaml
/// "*": --verbose
/// install: [install_base=/home/me/opt, --uninst]
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RcFile {
    actions: BTreeMap<String, Vec<String>>,
}

impl RcFile {
    /// Key whose arguments apply to every action.
    pub const ALL_ACTIONS: &'static str = "*";

    /// Load the rc file, if any.
    pub fn discover() -> Result<Self> {
        match ConfigPaths::find_rc() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let value = load_config_value(path)?;
        Self::parse(&value, path)
    }

    pub fn parse(value: &serde_yaml::Value, path: &Path) -> Result<Self> {
        let mut rc = Self::default();
        for (action, value) in parse_properties(value, path)? {
            let words = match value {
                PropertyValue::Text(text) => text.split_whitespace().map(String::from).collect(),
                PropertyValue::List(items) => items,
                PropertyValue::Null => Vec::new(),
                _ => {
                    return Err(BuildError::ConfigValidationError {
                        message: format!(
                            "{}: arguments for '{}' must be a string or a list",
                            path.display(),
                            action
                        ),
                    })
                }
            };
            rc.actions.insert(action, words);
        }
        Ok(rc)
    }

    /// Arguments for `action`: the `*` entry followed by the action's own.
    pub fn args_for(&self, action: &str) -> Vec<String> {
        let mut args = self
            .actions
            .get(Self::ALL_ACTIONS)
            .cloned()
            .unwrap_or_default();
        if action != Self::ALL_ACTIONS {
            args.extend(self.actions.get(action).into_iter().flatten().cloned());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_finds_project_and_local_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "dist_name: Foo").unwrap();
        fs::write(temp.path().join(LOCAL_CONFIG_FILE), "").unwrap();

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.has_project_config());
        assert_eq!(paths.property_files().len(), 2);
    }

    #[test]
    fn find_project_root_walks_up() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("lib").join("Foo");
        fs::create_dir_all(&subdir).unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "").unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn load_properties_converts_yaml_types() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"
dist_name: Foo-Bar
dist_version: 1.25
verbose: true
include-dirs: [inc, /opt/inc]
requires:
  Foo::Base: ">= 1.0, < 2.0"
"#,
        )
        .unwrap();

        let props = load_properties(temp.path()).unwrap();
        assert_eq!(props["dist_name"], PropertyValue::from("Foo-Bar"));
        assert_eq!(props["dist_version"], PropertyValue::from("1.25"));
        assert_eq!(props["verbose"], PropertyValue::Flag(true));
        assert_eq!(
            props["include_dirs"],
            PropertyValue::List(vec!["inc".into(), "/opt/inc".into()])
        );
        assert_eq!(
            props["requires"].as_map().unwrap()["Foo::Base"],
            ">= 1.0, < 2.0"
        );
    }

    #[test]
    fn local_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "dist_name: Foo\nverbose: false").unwrap();
        fs::write(temp.path().join(LOCAL_CONFIG_FILE), "verbose: true").unwrap();

        let props = load_properties(temp.path()).unwrap();
        assert_eq!(props["dist_name"], PropertyValue::from("Foo"));
        assert_eq!(props["verbose"], PropertyValue::Flag(true));
    }

    #[test]
    fn non_mapping_config_is_invalid() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "- a\n- b\n").unwrap();

        assert!(matches!(
            load_properties(temp.path()),
            Err(BuildError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "dist_name: [unclosed").unwrap();

        assert!(matches!(
            load_properties(temp.path()),
            Err(BuildError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn empty_config_has_no_properties() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "\n").unwrap();
        assert!(load_properties(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn rc_args_combine_global_and_action_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rc.yml");
        fs::write(
            &path,
            "\"*\": --verbose\ninstall: [install_base=/home/me/opt, --uninst]\n",
        )
        .unwrap();

        let rc = RcFile::load(&path).unwrap();
        assert_eq!(
            rc.args_for("install"),
            ["--verbose", "install_base=/home/me/opt", "--uninst"]
        );
        assert_eq!(rc.args_for("test"), ["--verbose"]);
    }

    #[test]
    fn rc_rejects_mappings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rc.yml");
        fs::write(&path, "install:\n  a: b\n").unwrap();
        assert!(RcFile::load(&path).is_err());
    }
}
