//! The build orchestrator.
//!
//! A [`Builder`] owns everything about one distribution: its merged
//! property values, the registered actions, and the collaborators used to
//! check prerequisites and run external tools. [`Builder::dispatch`] runs
//! an action and everything it depends on.
//!
//! # Example
//!
//! ```no_run
//! use modbuild::{Builder, BuilderOptions};
//!
//! let options = BuilderOptions::new(".")
//!     .property("module_name", "Foo::Bar")
//!     .property("dist_version", "1.0");
//! let mut builder = Builder::new(options)?;
//! builder.dispatch(Some("build"), Vec::new())?;
//! # Ok::<(), modbuild::BuildError>(())
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::actions::{default_classes, ActionContext, ActionRegistry, BuildClass};
use crate::config::load_properties;
use crate::error::{BuildError, Result};
use crate::install::{InstallConfig, InstallType};
use crate::prereqs::{
    extract_version, ModuleInspector, PrereqChecker, PrereqFailures, Prerequisites,
    ResidentModules, RuntimeIdentity, SearchPathInspector,
};
use crate::properties::{OverrideGuard, Properties, PropertyRegistry, PropertyValue};
use crate::state::{Checkpoint, BUILD_DIR};
use crate::toolchain::Toolchain;

/// Everything needed to construct a [`Builder`].
pub struct BuilderOptions {
    /// Distribution root.
    pub base_dir: PathBuf,

    /// Explicit property values, overriding registered defaults.
    pub properties: BTreeMap<String, PropertyValue>,

    /// Classes applied after the core and platform classes.
    pub classes: Vec<Box<dyn BuildClass>>,

    /// Dependency inspector; defaults to searching `lib` and `MODBUILD_PATH`.
    pub inspector: Option<Box<dyn ModuleInspector>>,

    /// External tools; defaults to `cc` and tar.gz archives.
    pub toolchain: Option<Toolchain>,

    /// Extra names resolved as runtime identities.
    pub identities: Vec<RuntimeIdentity>,
}

impl BuilderOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            properties: BTreeMap::new(),
            classes: Vec::new(),
            inspector: None,
            toolchain: None,
            identities: Vec::new(),
        }
    }

    /// Options with property values read from the distribution's config files.
    pub fn from_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut options = Self::new(base_dir);
        options.properties = load_properties(&options.base_dir)?;
        Ok(options)
    }

    pub fn property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn class(mut self, class: impl BuildClass + 'static) -> Self {
        self.classes.push(Box::new(class));
        self
    }

    pub fn inspector(mut self, inspector: impl ModuleInspector + 'static) -> Self {
        self.inspector = Some(Box::new(inspector));
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    pub fn identity(mut self, identity: RuntimeIdentity) -> Self {
        self.identities.push(identity);
        self
    }
}

/// Builds, tests and installs one distribution.
pub struct Builder {
    base_dir: PathBuf,
    classes: Vec<String>,
    registry: PropertyRegistry,
    properties: Properties,
    actions: ActionRegistry,
    inspector: Box<dyn ModuleInspector>,
    resident: ResidentModules,
    identities: Vec<RuntimeIdentity>,
    toolchain: Toolchain,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("base_dir", &self.base_dir)
            .field("classes", &self.classes)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Construct a builder.
    ///
    /// Fails with [`BuildError::ConfigValidationError`] when the
    /// distribution name or version cannot be determined.
    pub fn new(options: BuilderOptions) -> Result<Self> {
        let BuilderOptions {
            base_dir,
            properties,
            classes: user_classes,
            inspector,
            toolchain,
            identities: extra_identities,
        } = options;

        let mut classes = default_classes();
        classes.extend(user_classes);

        let mut registry = PropertyRegistry::new();
        let mut actions = ActionRegistry::new();
        for class in &classes {
            registry.add_class(class.name());
            class.register_properties(&mut registry)?;
            class.register_actions(&mut actions)?;
        }

        let properties = Properties::new(&registry, properties)?;

        let inspector: Box<dyn ModuleInspector> = match inspector {
            Some(inspector) => inspector,
            None => {
                let mut paths = vec![base_dir.join(properties.text("lib_dir").unwrap_or("lib"))];
                paths.extend(SearchPathInspector::from_env().search_paths().iter().cloned());
                Box::new(SearchPathInspector::new(paths))
            }
        };

        let mut identities = vec![RuntimeIdentity::engine()];
        identities.extend(extra_identities);

        let mut builder = Self {
            base_dir,
            classes: classes.iter().map(|c| c.name().to_string()).collect(),
            registry,
            properties,
            actions,
            inspector,
            resident: ResidentModules::new(),
            identities,
            toolchain: toolchain.unwrap_or_default(),
        };
        builder.resolve_dist_identity()?;

        tracing::debug!(
            "Builder for {} {} with classes {:?}",
            builder.dist_name(),
            builder.dist_version(),
            builder.classes
        );
        Ok(builder)
    }

    /// Construct a builder from the checkpoint written by `configure`.
    ///
    /// Checkpointed values take precedence over `options.properties`.
    pub fn resume(mut options: BuilderOptions) -> Result<Self> {
        let checkpoint = Checkpoint::load(&options.base_dir)?.ok_or_else(|| {
            BuildError::ConfigValidationError {
                message: format!(
                    "No checkpoint at {}, run the 'configure' action first",
                    Checkpoint::path(&options.base_dir).display()
                ),
            }
        })?;

        let saved_classes = checkpoint.classes.clone();
        options.properties.extend(checkpoint.into_values());
        let builder = Self::new(options)?;

        if builder.classes != saved_classes {
            tracing::warn!(
                "Build classes changed since configure: was {:?}, now {:?}",
                saved_classes,
                builder.classes
            );
        }
        Ok(builder)
    }

    fn resolve_dist_identity(&mut self) -> Result<()> {
        let module_name = self.properties.text("module_name").map(String::from);

        if self.properties.text("dist_name").is_none() {
            if let Some(module) = &module_name {
                self.properties.set("dist_name", module.replace("::", "-"))?;
            }
        }
        if module_name.is_none() {
            if let Some(dist) = self.properties.text("dist_name").map(String::from) {
                self.properties.set("module_name", dist.replace('-', "::"))?;
            }
        }

        if self.properties.text("dist_version").is_none() {
            if let Some(version) = self.version_from_source()? {
                self.properties.set("dist_version", version)?;
            }
        }

        if self.properties.text("dist_name").is_none() {
            return Err(BuildError::ConfigValidationError {
                message: "Can't determine distribution name, set 'module_name' or 'dist_name'"
                    .to_string(),
            });
        }
        if self.properties.text("dist_version").is_none() {
            return Err(BuildError::ConfigValidationError {
                message: format!(
                    "Can't determine a version for {}, set 'dist_version' or 'dist_version_from'",
                    self.dist_name()
                ),
            });
        }
        Ok(())
    }

    /// Read the version declared in `dist_version_from`, or in the main
    /// module file when that is not set.
    fn version_from_source(&self) -> Result<Option<String>> {
        let source = match self.properties.text("dist_version_from") {
            Some(from) => Some(self.path(from)),
            None => self.properties.text("module_name").and_then(|module| {
                SearchPathInspector::new(vec![self.path(self.lib_dir_name())]).find(module)
            }),
        };
        let Some(source) = source else {
            return Ok(None);
        };

        let content = fs::read_to_string(&source)?;
        let version = extract_version(&content);
        if version.is_none() {
            tracing::warn!("No version declaration found in {}", source.display());
        }
        Ok(version)
    }

    fn lib_dir_name(&self) -> &str {
        self.properties.text("lib_dir").unwrap_or("lib")
    }

    /// Distribution root.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `rel` resolved against the distribution root.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(rel)
    }

    /// Build bookkeeping directory (`_build`).
    pub fn build_dir(&self) -> PathBuf {
        self.path(BUILD_DIR)
    }

    /// Staging tree (`blib`).
    pub fn blib(&self) -> PathBuf {
        self.path(self.properties.text("blib").unwrap_or("blib"))
    }

    pub fn dist_name(&self) -> &str {
        self.properties.text("dist_name").unwrap_or_default()
    }

    pub fn dist_version(&self) -> &str {
        self.properties.text("dist_version").unwrap_or_default()
    }

    /// `<dist_name>-<dist_version>`.
    pub fn dist_dir_name(&self) -> String {
        format!("{}-{}", self.dist_name(), self.dist_version())
    }

    /// Class names in precedence order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    pub fn props(&self) -> &Properties {
        &self.properties
    }

    pub fn props_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Dependencies recorded as already loaded.
    pub fn resident_mut(&mut self) -> &mut ResidentModules {
        &mut self.resident
    }

    /// A checker over this builder's collaborators.
    pub fn checker(&self) -> PrereqChecker<'_> {
        PrereqChecker::new(self.inspector.as_ref(), &self.resident, &self.identities)
    }

    /// Every declared prerequisite bucket.
    pub fn prerequisites(&self) -> Prerequisites {
        Prerequisites::from_properties(&self.properties)
    }

    /// Every violated prerequisite, or `None` when all are satisfied.
    pub fn prereq_failures(&self) -> Option<PrereqFailures> {
        self.checker().prereq_failures(&self.prerequisites())
    }

    /// Gate `action` on its own prerequisite buckets.
    pub fn validate_action_prereqs(&self, action: &str) -> Result<()> {
        self.checker()
            .validate_action_prereqs(action, &self.prerequisites())
    }

    pub fn install_config(&self) -> Result<InstallConfig> {
        InstallConfig::from_properties(&self.properties)
    }

    /// Where elements of `ty` install to, before `destdir` is applied.
    pub fn install_destination(&self, ty: InstallType) -> Result<Option<PathBuf>> {
        Ok(self.install_config()?.install_destination(ty))
    }

    /// Snapshot of the current configuration.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(self.classes.clone(), &self.properties)
    }

    /// Write the configuration checkpoint, returning its path.
    pub fn write_checkpoint(&self) -> Result<PathBuf> {
        self.checkpoint().save(&self.base_dir)
    }

    /// Run `action` (or the default action) with scoped property overrides.
    ///
    /// Each call starts with an empty completed set. Overrides are undone
    /// when the call returns, whether or not the action succeeded.
    pub fn dispatch(
        &mut self,
        action: Option<&str>,
        overrides: Vec<(String, PropertyValue)>,
    ) -> Result<()> {
        let action = match action {
            Some(action) => action.to_string(),
            None => self
                .properties
                .text("default_action")
                .map(String::from)
                .ok_or(BuildError::NoAction)?,
        };

        let mut scoped = OverrideGuard::new(self, overrides)?;
        let mut ctx = ActionContext::new(&mut scoped);
        ctx.call_action(&action)
    }
}

impl AsMut<Properties> for Builder {
    fn as_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}
