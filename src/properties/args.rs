//! Action invocation argument parsing.
//!
//! Invocation arguments are a flat list of words:
//!
//! - `key=value` and `--key=value` set a value
//! - `--flag` sets a flag
//! - `--no-flag` and `--noflag` clear a flag
//! - repeating an additive key collects its values into a list; for any
//!   other key the last value wins
//! - the first bare word names the action
//!
//! Hyphens in keys are normalized to underscores.

use crate::error::{BuildError, Result};

use super::value::PropertyValue;

/// How a name is registered, as far as argument parsing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Not a registered property.
    Unknown,
    /// A registered property holding a single value.
    Scalar,
    /// A registered list or map property.
    Additive,
}

impl ArgKind {
    pub fn is_known(self) -> bool {
        self != ArgKind::Unknown
    }
}

/// Parsed invocation arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationArgs {
    /// Requested action, if any.
    pub action: Option<String>,
    /// Key/value pairs in the order given, repeated keys collapsed.
    pub properties: Vec<(String, PropertyValue)>,
}

/// Parse invocation words.
///
/// `kind` reports how a name is registered. It decides whether `--noname`
/// negates `name` or sets a flag called `noname`, and whether repeats of a
/// key collect into a list.
pub fn parse_invocation<S, F>(words: &[S], kind: F) -> Result<InvocationArgs>
where
    S: AsRef<str>,
    F: Fn(&str) -> ArgKind,
{
    let mut parsed = InvocationArgs::default();

    for word in words {
        let word = word.as_ref();
        let stripped = word.trim_start_matches('-');
        let is_option = stripped.len() != word.len();

        if let Some((key, value)) = stripped.split_once('=') {
            let key = normalize_key(word, key)?;
            let additive = kind(&key) == ArgKind::Additive;
            push(&mut parsed.properties, key, PropertyValue::Text(value.to_string()), additive);
        } else if is_option {
            let key = normalize_key(word, stripped)?;
            let (key, value) = negation(&key, &kind).unwrap_or((key, true));
            let additive = kind(&key) == ArgKind::Additive;
            push(&mut parsed.properties, key, PropertyValue::Flag(value), additive);
        } else if parsed.action.is_none() {
            parsed.action = Some(word.to_string());
        } else {
            return Err(BuildError::InvalidArgument {
                arg: word.to_string(),
                message: format!(
                    "unexpected word after action '{}'",
                    parsed.action.as_deref().unwrap_or_default()
                ),
            });
        }
    }

    Ok(parsed)
}

fn normalize_key(word: &str, key: &str) -> Result<String> {
    let key = key.trim().replace('-', "_");
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(BuildError::InvalidArgument {
            arg: word.to_string(),
            message: "argument names may only contain letters, digits, '-' and '_'".to_string(),
        });
    }
    Ok(key)
}

fn negation<F: Fn(&str) -> ArgKind>(key: &str, kind: &F) -> Option<(String, bool)> {
    if kind(key).is_known() {
        return None;
    }
    let rest = key.strip_prefix("no")?;
    let rest = rest.strip_prefix('_').unwrap_or(rest);
    if !rest.is_empty() && kind(rest).is_known() {
        return Some((rest.to_string(), false));
    }
    None
}

fn push(
    properties: &mut Vec<(String, PropertyValue)>,
    key: String,
    value: PropertyValue,
    additive: bool,
) {
    let Some((_, existing)) = properties.iter_mut().find(|(k, _)| *k == key) else {
        properties.push((key, value));
        return;
    };
    if !additive {
        *existing = value;
        return;
    }

    let incoming = value.to_string();
    match existing {
        PropertyValue::List(items) => items.push(incoming),
        other => {
            let first = other.to_string();
            *other = PropertyValue::List(vec![first, incoming]);
        }
    }
}
