//! Per-builder property values.
//!
//! [`Properties`] holds the values of every registered property plus a
//! free-form bag of unrecognized arguments. Values are initialized from the
//! registry defaults and then mutated by accessors, argument merging and
//! scoped overrides.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;

use regex::Regex;

use super::registry::PropertyRegistry;
use super::value::PropertyValue;
use crate::error::{BuildError, Result};

/// Property values for one builder instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
    additive: BTreeSet<String>,
    args: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// Initialize values from registry defaults.
    ///
    /// Explicitly supplied values replace defaults; keys the registry does
    /// not know go to the argument bag.
    pub fn new(
        registry: &PropertyRegistry,
        explicit: BTreeMap<String, PropertyValue>,
    ) -> Result<Self> {
        let mut props = Self {
            values: registry.valid_properties_defaults(),
            additive: registry.additive_names(),
            args: BTreeMap::new(),
        };

        for (name, value) in explicit {
            if props.additive.contains(&name) {
                let value = props.coerce_container(&name, value)?;
                props.values.insert(name, value);
            } else if props.values.contains_key(&name) {
                props.values.insert(name, value);
            } else {
                props.args.insert(name, value);
            }
        }

        Ok(props)
    }

    /// Whether `name` is a registered property.
    pub fn is_valid(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_additive(&self, name: &str) -> bool {
        self.additive.contains(name)
    }

    /// Value of a registered property.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Value of a registered property, falling back to the argument bag.
    pub fn lookup(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name).or_else(|| self.args.get(name))
    }

    /// Text value of a property, if set to non-empty text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.lookup(name)
            .and_then(PropertyValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// Truthiness of a property; unknown properties are false.
    pub fn flag(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(PropertyValue::is_true)
    }

    /// List value of a property; empty for anything else.
    pub fn list(&self, name: &str) -> &[String] {
        self.lookup(name)
            .and_then(PropertyValue::as_list)
            .unwrap_or(&[])
    }

    /// Map value of a property.
    pub fn map(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.lookup(name).and_then(PropertyValue::as_map)
    }

    /// Replace the value of a registered property.
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        if !self.is_valid(name) {
            return Err(BuildError::ConfigValidationError {
                message: format!("unknown property '{}'", name),
            });
        }
        let mut value = value.into();
        if self.is_additive(name) {
            value = self.coerce_container(name, value)?;
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Store a free-form argument.
    pub fn set_arg(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.args.insert(name.to_string(), value.into());
    }

    pub fn arg(&self, name: &str) -> Option<&PropertyValue> {
        self.args.get(name)
    }

    /// Registered property values.
    pub fn values(&self) -> &BTreeMap<String, PropertyValue> {
        &self.values
    }

    /// Free-form arguments.
    pub fn args(&self) -> &BTreeMap<String, PropertyValue> {
        &self.args
    }

    /// Merge incoming key/value pairs.
    ///
    /// Additive properties merge key-wise into the existing container,
    /// other registered properties are overwritten, and unknown keys are
    /// stored in the argument bag.
    pub fn merge_args<I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        for (name, value) in pairs {
            if self.additive.contains(&name) {
                let current = self.values.entry(name.clone()).or_default();
                merge_into(&name, current, value)?;
            } else if self.values.contains_key(&name) {
                self.values.insert(name, value);
            } else {
                self.args.insert(name, value);
            }
        }
        Ok(())
    }

    /// Apply an override layer, returning what is needed to undo it.
    pub fn apply_overrides(
        &mut self,
        overrides: Vec<(String, PropertyValue)>,
    ) -> Result<SavedProperties> {
        let mut saved = SavedProperties::default();
        for (name, _) in &overrides {
            if !saved.entries.iter().any(|e| &e.name == name) {
                saved.entries.push(SavedEntry {
                    name: name.clone(),
                    value: self.values.get(name).cloned(),
                    arg: self.args.get(name).cloned(),
                });
            }
        }

        if let Err(e) = self.merge_args(overrides) {
            self.restore(saved);
            return Err(e);
        }
        Ok(saved)
    }

    /// Undo an override layer.
    pub fn restore(&mut self, saved: SavedProperties) {
        for entry in saved.entries.into_iter().rev() {
            match entry.value {
                Some(v) => self.values.insert(entry.name.clone(), v),
                None => self.values.remove(&entry.name),
            };
            match entry.arg {
                Some(v) => self.args.insert(entry.name, v),
                None => self.args.remove(&entry.name),
            };
        }
    }

    fn coerce_container(&self, name: &str, value: PropertyValue) -> Result<PropertyValue> {
        let mut container = match self.values.get(name) {
            Some(PropertyValue::Map(_)) => PropertyValue::Map(BTreeMap::new()),
            Some(PropertyValue::List(_)) => PropertyValue::List(Vec::new()),
            _ => return Ok(value),
        };
        merge_into(name, &mut container, value)?;
        Ok(container)
    }
}

impl AsMut<Properties> for Properties {
    fn as_mut(&mut self) -> &mut Properties {
        self
    }
}

fn merge_into(name: &str, current: &mut PropertyValue, incoming: PropertyValue) -> Result<()> {
    match (current, incoming) {
        (_, PropertyValue::Null) => {}
        (PropertyValue::Map(map), PropertyValue::Map(other)) => map.extend(other),
        (PropertyValue::Map(map), PropertyValue::Text(text)) => {
            map.extend(hashify(name, &text)?);
        }
        (PropertyValue::Map(map), PropertyValue::List(items)) => {
            for item in items {
                map.extend(hashify(name, &item)?);
            }
        }
        (PropertyValue::List(list), PropertyValue::List(items)) => union(list, items),
        (PropertyValue::List(list), PropertyValue::Text(text)) => union(
            list,
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        ),
        (PropertyValue::Map(_), other) | (PropertyValue::List(_), other) => {
            return Err(BuildError::InvalidArgument {
                arg: format!("{}={}", name, other),
                message: format!("'{}' expects a list or key=value pairs", name),
            });
        }
        (slot, other) => *slot = other,
    }
    Ok(())
}

fn union(list: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

static RE_PAIR_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][\w:]*)\s*=(.*)$").expect("valid key=value regex")
});

/// Split `key=value[,key=value...]` into pairs.
///
/// A comma starts a new pair only when the next segment opens with a name
/// followed by `=`. Anything else continues the previous value, so version
/// specifications such as `Foo=>= 1.0, != 1.5` stay intact. Returns `None`
/// when the text does not open with a pair.
pub(crate) fn split_pairs(text: &str) -> Option<Vec<(String, String)>> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for segment in text.split(',') {
        if let Some(caps) = RE_PAIR_START.captures(segment) {
            pairs.push((caps[1].to_string(), caps[2].trim().to_string()));
            continue;
        }
        let (_, value) = pairs.last_mut()?;
        if !segment.trim().is_empty() {
            value.push_str(", ");
            value.push_str(segment.trim());
        }
    }

    (!pairs.is_empty()).then_some(pairs)
}

/// Turn `key=value[,key=value...]` into map entries.
fn hashify(name: &str, text: &str) -> Result<BTreeMap<String, String>> {
    let pairs = split_pairs(text).ok_or_else(|| BuildError::InvalidArgument {
        arg: format!("{}={}", name, text),
        message: "expected key=value".to_string(),
    })?;
    Ok(pairs.into_iter().collect())
}

#[derive(Debug, Clone)]
struct SavedEntry {
    name: String,
    value: Option<PropertyValue>,
    arg: Option<PropertyValue>,
}

/// Values replaced by an override layer.
#[derive(Debug, Clone, Default)]
pub struct SavedProperties {
    entries: Vec<SavedEntry>,
}

/// Applies property overrides for the lifetime of the guard.
///
/// The guard dereferences to the overridden target and restores every
/// touched key when dropped, including on early return and error paths.
///
/// # Example
///
/// ```
/// use modbuild::properties::{OverrideGuard, Properties, PropertyRegistry, PropertyValue};
/// use std::collections::BTreeMap;
///
/// let mut registry = PropertyRegistry::new();
/// registry.add_class("core");
/// registry.add_property("core", "verbose", false).unwrap();
/// let mut props = Properties::new(&registry, BTreeMap::new()).unwrap();
///
/// {
///     let scoped = OverrideGuard::new(
///         &mut props,
///         vec![("verbose".to_string(), PropertyValue::Flag(true))],
///     )
///     .unwrap();
///     assert!(scoped.flag("verbose"));
/// }
/// assert!(!props.flag("verbose"));
/// ```
pub struct OverrideGuard<'a, T: AsMut<Properties>> {
    target: &'a mut T,
    saved: Option<SavedProperties>,
}

impl<'a, T: AsMut<Properties>> OverrideGuard<'a, T> {
    /// Apply `overrides` to `target` until the guard is dropped.
    pub fn new(target: &'a mut T, overrides: Vec<(String, PropertyValue)>) -> Result<Self> {
        let saved = target.as_mut().apply_overrides(overrides)?;
        Ok(Self {
            target,
            saved: Some(saved),
        })
    }
}

impl<T: AsMut<Properties>> Deref for OverrideGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: AsMut<Properties>> DerefMut for OverrideGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: AsMut<Properties>> Drop for OverrideGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.target.as_mut().restore(saved);
        }
    }
}
