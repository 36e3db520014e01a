//! Build classes.
//!
//! A build class contributes one layer of property defaults and a set of
//! action handlers. Classes are applied in order: [`CoreClass`], then the
//! platform class, then any user classes. A property may only be declared
//! once along that chain, while actions registered later replace earlier
//! ones.

use std::collections::BTreeMap;

use super::builtin;
use super::registry::ActionRegistry;
use crate::error::Result;
use crate::properties::{PropertyRegistry, PropertyValue};

/// A layer of properties and actions.
pub trait BuildClass {
    /// Class name, unique within a builder.
    fn name(&self) -> &str;

    /// Declare this class's properties.
    fn register_properties(&self, _registry: &mut PropertyRegistry) -> Result<()> {
        Ok(())
    }

    /// Register or override actions.
    fn register_actions(&self, _actions: &mut ActionRegistry) -> Result<()> {
        Ok(())
    }
}

fn empty_map() -> PropertyValue {
    PropertyValue::Map(BTreeMap::new())
}

fn list(items: &[&str]) -> PropertyValue {
    PropertyValue::List(items.iter().map(|s| s.to_string()).collect())
}

/// The engine's own properties and standard actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreClass;

impl CoreClass {
    pub const NAME: &'static str = "core";
}

impl BuildClass for CoreClass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register_properties(&self, registry: &mut PropertyRegistry) -> Result<()> {
        let defaults: Vec<(&str, PropertyValue)> = vec![
            // Distribution identity
            ("module_name", PropertyValue::Null),
            ("dist_name", PropertyValue::Null),
            ("dist_version", PropertyValue::Null),
            ("dist_version_from", PropertyValue::Null),
            ("dist_files", list(&["modbuild.yml", "lib", "bin", "src", "t", "README", "Changes", "LICENSE"])),
            // Layout
            ("blib", "blib".into()),
            ("lib_dir", "lib".into()),
            ("script_dir", "bin".into()),
            ("c_source", PropertyValue::Null),
            ("include_dirs", list(&[])),
            ("extra_compiler_flags", list(&[])),
            ("extra_linker_flags", list(&[])),
            ("add_to_cleanup", list(&[])),
            // Tools
            ("doc_command", PropertyValue::Null),
            ("test_dir", "t".into()),
            ("test_extension", "t".into()),
            ("test_files", list(&[])),
            ("test_command", "{file}".into()),
            // Behaviour
            ("default_action", PropertyValue::Null),
            ("verbose", false.into()),
            // Installation
            ("installdirs", "site".into()),
            ("install_base", PropertyValue::Null),
            ("prefix", PropertyValue::Null),
            ("destdir", PropertyValue::Null),
            ("install_path", empty_map()),
            ("install_base_relpaths", empty_map()),
            ("prefix_relpaths", empty_map()),
            ("install_sets", empty_map()),
            ("original_prefix", empty_map()),
            // Prerequisites
            ("requires", empty_map()),
            ("recommends", empty_map()),
            ("conflicts", empty_map()),
            ("configure_requires", empty_map()),
            ("build_requires", empty_map()),
            ("test_requires", empty_map()),
        ];

        for (name, default) in defaults {
            registry.add_property(Self::NAME, name, default)?;
        }
        Ok(())
    }

    fn register_actions(&self, actions: &mut ActionRegistry) -> Result<()> {
        builtin::register(Self::NAME, actions)
    }
}

/// Unix platform defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixClass;

impl UnixClass {
    pub const NAME: &'static str = "unix";
}

impl BuildClass for UnixClass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register_properties(&self, registry: &mut PropertyRegistry) -> Result<()> {
        let ext = if cfg!(target_os = "macos") { "dylib" } else { "so" };
        registry.add_property(Self::NAME, "shared_lib_ext", ext)?;
        registry.add_property(Self::NAME, "script_mode", "755")?;
        Ok(())
    }
}

/// Windows platform defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsClass;

impl WindowsClass {
    pub const NAME: &'static str = "windows";
}

impl BuildClass for WindowsClass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register_properties(&self, registry: &mut PropertyRegistry) -> Result<()> {
        registry.add_property(Self::NAME, "shared_lib_ext", "dll")?;
        registry.add_property(Self::NAME, "script_mode", PropertyValue::Null)?;
        Ok(())
    }
}

/// The core class followed by the class for the current platform.
pub fn default_classes() -> Vec<Box<dyn BuildClass>> {
    let platform: Box<dyn BuildClass> = if cfg!(windows) {
        Box::new(WindowsClass)
    } else {
        Box::new(UnixClass)
    };
    vec![Box::new(CoreClass), platform]
}
