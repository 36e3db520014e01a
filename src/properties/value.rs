//! Property values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A configuration property value.
///
/// Container values (`List` and `Map`) are additive: they merge with
/// existing values instead of replacing them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl PropertyValue {
    /// Whether this value merges additively.
    pub fn is_additive(&self) -> bool {
        matches!(self, PropertyValue::List(_) | PropertyValue::Map(_))
    }

    /// Truthiness: `Null`, `false`, `""` and `"0"` are false.
    pub fn is_true(&self) -> bool {
        match self {
            PropertyValue::Null => false,
            PropertyValue::Flag(b) => *b,
            PropertyValue::Text(s) => !(s.is_empty() || s == "0"),
            PropertyValue::List(l) => !l.is_empty(),
            PropertyValue::Map(m) => !m.is_empty(),
        }
    }

    /// The value as text, if it is a scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            PropertyValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert a parsed YAML value.
    ///
    /// Scalars become text, sequences become lists and mappings become maps.
    /// Nested containers are flattened to their YAML text.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Flag(*b),
            Value::Sequence(seq) => PropertyValue::List(seq.iter().map(yaml_scalar).collect()),
            Value::Mapping(map) => PropertyValue::Map(
                map.iter()
                    .map(|(k, v)| (yaml_scalar(k), yaml_scalar(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => PropertyValue::from_yaml(&tagged.value),
            other => PropertyValue::Text(yaml_scalar(other)),
        }
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> String {
    use serde_yaml::Value;

    match value {
        Value::Null => String::new(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("~"),
            PropertyValue::Flag(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::List(l) => f.write_str(&l.join(",")),
            PropertyValue::Map(m) => {
                let pairs: Vec<String> = m.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                f.write_str(&pairs.join(","))
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Flag(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(l: Vec<String>) -> Self {
        PropertyValue::List(l)
    }
}

impl From<BTreeMap<String, String>> for PropertyValue {
    fn from(m: BTreeMap<String, String>) -> Self {
        PropertyValue::Map(m)
    }
}
