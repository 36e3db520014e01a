//! Layered property defaults.
//!
//! Each build class contributes one layer of property defaults. Layers are
//! ordered from the most general class (the core engine) to the most
//! specific one, and a class's ancestor chain is every layer up to and
//! including its own.

use std::collections::{BTreeMap, BTreeSet};

use super::value::PropertyValue;
use crate::error::{BuildError, Result};

/// Property defaults declared by one build class.
#[derive(Debug, Clone, Default)]
pub struct PropertyLayer {
    /// Name of the declaring class.
    pub class: String,
    /// Defaults declared by this class.
    pub defaults: BTreeMap<String, PropertyValue>,
    /// Names of container-valued properties declared by this class.
    pub additive: BTreeSet<String>,
}

impl PropertyLayer {
    fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }
}

/// Registry of property defaults across build classes.
///
/// # Example
///
/// ```
/// use modbuild::properties::{PropertyRegistry, PropertyValue};
///
/// let mut registry = PropertyRegistry::new();
/// registry.add_class("core");
/// registry.add_property("core", "verbose", false).unwrap();
/// registry.add_property("core", "include_dirs", Vec::<String>::new()).unwrap();
///
/// registry.add_class("unix");
/// assert!(registry.add_property("unix", "verbose", true).is_err());
///
/// assert!(registry.is_additive("include_dirs"));
/// assert_eq!(
///     registry.valid_properties_defaults()["verbose"],
///     PropertyValue::Flag(false)
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    layers: Vec<PropertyLayer>,
}

impl PropertyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class layer. Adding an existing class is a no-op.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.layers.push(PropertyLayer::new(class));
        }
    }

    /// Whether a class layer exists.
    pub fn has_class(&self, class: &str) -> bool {
        self.layers.iter().any(|l| l.class == class)
    }

    /// Class names, most general first.
    pub fn classes(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.class.as_str()).collect()
    }

    /// Register a property default for `class`.
    ///
    /// Fails when the name is already declared anywhere in the class's
    /// ancestor chain. Container defaults are recorded as additive.
    pub fn add_property(
        &mut self,
        class: &str,
        name: &str,
        default: impl Into<PropertyValue>,
    ) -> Result<()> {
        let index = self
            .layers
            .iter()
            .position(|l| l.class == class)
            .ok_or_else(|| BuildError::UnknownClass {
                name: class.to_string(),
            })?;

        if let Some(owner) = self.layers[..=index]
            .iter()
            .find(|l| l.defaults.contains_key(name))
        {
            return Err(BuildError::DuplicateProperty {
                name: name.to_string(),
                class: owner.class.clone(),
            });
        }

        let default = default.into();
        let layer = &mut self.layers[index];
        if default.is_additive() {
            layer.additive.insert(name.to_string());
        }
        layer.defaults.insert(name.to_string(), default);
        Ok(())
    }

    /// Merge defaults across all layers, most specific winning.
    pub fn valid_properties_defaults(&self) -> BTreeMap<String, PropertyValue> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            for (name, value) in &layer.defaults {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }

    /// Whether `name` is a registered property.
    pub fn is_valid(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.defaults.contains_key(name))
    }

    /// Whether `name` is a container-valued property.
    pub fn is_additive(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.additive.contains(name))
    }

    /// Names of all additive properties.
    pub fn additive_names(&self) -> BTreeSet<String> {
        self.layers
            .iter()
            .flat_map(|l| l.additive.iter().cloned())
            .collect()
    }

    /// The class that declared `name`.
    pub fn declared_by(&self, name: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.defaults.contains_key(name))
            .map(|l| l.class.as_str())
    }

    pub fn layers(&self) -> &[PropertyLayer] {
        &self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PropertyRegistry {
        let mut registry = PropertyRegistry::new();
        registry.add_class("core");
        registry.add_class("unix");
        registry.add_class("custom");
        registry
    }

    #[test]
    fn unknown_class_is_an_error() {
        let mut registry = PropertyRegistry::new();
        let err = registry.add_property("nope", "x", "1").unwrap_err();
        assert!(matches!(err, BuildError::UnknownClass { .. }));
    }

    #[test]
    fn redeclaration_in_same_class_fails() {
        let mut registry = registry();
        registry.add_property("core", "verbose", false).unwrap();
        let err = registry.add_property("core", "verbose", true).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateProperty { .. }));
    }

    #[test]
    fn redeclaration_in_descendant_fails() {
        let mut registry = registry();
        registry.add_property("core", "blib", "blib").unwrap();
        let err = registry.add_property("custom", "blib", "out").unwrap_err();
        match err {
            BuildError::DuplicateProperty { name, class } => {
                assert_eq!(name, "blib");
                assert_eq!(class, "core");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ancestor_may_declare_after_descendant() {
        // The ancestor chain of "core" does not include "custom".
        let mut registry = registry();
        registry.add_property("custom", "flavour", "mint").unwrap();
        registry.add_property("core", "flavour", "plain").unwrap();

        assert_eq!(
            registry.valid_properties_defaults()["flavour"],
            PropertyValue::Text("mint".into())
        );
        assert_eq!(registry.declared_by("flavour"), Some("custom"));
    }

    #[test]
    fn container_defaults_are_additive() {
        let mut registry = registry();
        registry
            .add_property("core", "requires", BTreeMap::<String, String>::new())
            .unwrap();
        registry
            .add_property("unix", "include_dirs", Vec::<String>::new())
            .unwrap();
        registry.add_property("core", "verbose", false).unwrap();

        assert!(registry.is_additive("requires"));
        assert!(registry.is_additive("include_dirs"));
        assert!(!registry.is_additive("verbose"));
        assert_eq!(registry.additive_names().len(), 2);
    }

    #[test]
    fn defaults_merge_across_layers() {
        let mut registry = registry();
        registry.add_property("core", "blib", "blib").unwrap();
        registry.add_property("unix", "shared_lib_ext", "so").unwrap();

        let defaults = registry.valid_properties_defaults();
        assert_eq!(defaults.len(), 2);
        assert!(registry.is_valid("blib"));
        assert!(registry.is_valid("shared_lib_ext"));
        assert!(!registry.is_valid("nope"));
    }

    #[test]
    fn add_class_is_idempotent() {
        let mut registry = registry();
        registry.add_class("core");
        assert_eq!(registry.classes(), vec!["core", "unix", "custom"]);
    }
}
