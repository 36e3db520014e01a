//! Prerequisite status types.
//!
//! Each prerequisite check produces an [`InstalledStatus`] describing what
//! version is installed, what was needed and whether the need is met.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel shown for a dependency that is not installed.
pub const NOT_INSTALLED: &str = "<none>";

/// The kind of a prerequisite bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrereqKind {
    Requires,
    Recommends,
    Conflicts,
}

impl PrereqKind {
    pub const ALL: [PrereqKind; 3] = [
        PrereqKind::Requires,
        PrereqKind::Recommends,
        PrereqKind::Conflicts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrereqKind::Requires => "requires",
            PrereqKind::Recommends => "recommends",
            PrereqKind::Conflicts => "conflicts",
        }
    }
}

impl fmt::Display for PrereqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prerequisite bucket: a kind, optionally scoped to one action.
///
/// Global buckets are named after their kind (`requires`); action-scoped
/// buckets are prefixed with the action (`test_requires`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrereqScope {
    pub action: Option<String>,
    pub kind: PrereqKind,
}

impl PrereqScope {
    pub fn global(kind: PrereqKind) -> Self {
        Self { action: None, kind }
    }

    pub fn action(action: impl Into<String>, kind: PrereqKind) -> Self {
        Self {
            action: Some(action.into()),
            kind,
        }
    }

    /// The bucket's property name.
    pub fn name(&self) -> String {
        match &self.action {
            Some(action) => format!("{}_{}", action, self.kind),
            None => self.kind.to_string(),
        }
    }
}

impl fmt::Display for PrereqScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for PrereqScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for kind in PrereqKind::ALL {
            if s == kind.as_str() {
                return Ok(Self::global(kind));
            }
            if let Some(action) = s
                .strip_suffix(kind.as_str())
                .and_then(|rest| rest.strip_suffix('_'))
            {
                if !action.is_empty()
                    && action.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Ok(Self::action(action, kind));
                }
            }
        }
        Err(format!("'{}' is not a prerequisite bucket", s))
    }
}

/// What is installed for a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Installed {
    /// Not installed at all.
    Missing,
    /// Installed without a declared version.
    Unversioned,
    /// Installed with a declared version.
    Version(String),
}

impl Installed {
    pub fn version(&self) -> Option<&str> {
        match self {
            Installed::Version(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Installed::Missing)
    }
}

impl fmt::Display for Installed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Installed::Missing => f.write_str(NOT_INSTALLED),
            Installed::Unversioned => f.write_str("undef"),
            Installed::Version(v) => f.write_str(v),
        }
    }
}

/// The result of checking one dependency against its specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledStatus {
    /// Dependency name.
    pub module: String,
    /// What is installed.
    pub have: Installed,
    /// The specification checked against.
    pub need: String,
    /// Whether `have` satisfies `need`.
    pub ok: bool,
    /// Why the check failed, or a synthesized report message.
    pub message: Option<String>,
}

impl InstalledStatus {
    pub(crate) fn new(module: &str, need: &str) -> Self {
        Self {
            module: module.to_string(),
            have: Installed::Missing,
            need: need.to_string(),
            ok: false,
            message: None,
        }
    }
}

/// Failures grouped by bucket name, then by dependency name.
pub type PrereqFailures = BTreeMap<String, BTreeMap<String, InstalledStatus>>;
