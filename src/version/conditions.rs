//! Version constraint specifications.
//!
//! A specification is either a bare version (meaning `>= version`) or a
//! comma-separated list of `<op> <version>` clauses which must all hold.

use std::sync::LazyLock;

use regex::Regex;

use super::compare::{compare_with, VersionOp};

static RE_BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w.]+)\s*$").expect("valid bare version regex"));

static RE_CLAUSE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid clause separator regex"));

static RE_CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(<=?|>=?|==|!=)\s*([\w.]+)\s*$").expect("valid condition regex")
});

/// A single parsed `<op> <version>` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub op: VersionOp,
    pub version: String,
}

impl Condition {
    /// Parse one clause. Returns `None` when the clause is malformed.
    pub fn parse(clause: &str) -> Option<Self> {
        let caps = RE_CONDITION.captures(clause)?;
        let op = caps.get(1)?.as_str().parse().ok()?;
        Some(Self {
            op,
            version: caps.get(2)?.as_str().to_string(),
        })
    }

    /// Whether `have` satisfies this clause.
    pub fn is_satisfied_by(&self, have: &str) -> bool {
        compare_with(have, self.op, &self.version)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// Split a constraint specification into its raw clauses.
///
/// A missing or blank spec means `>= 0`.
pub fn parse_conditions(spec: Option<&str>) -> Vec<String> {
    let spec = match spec.map(str::trim) {
        None | Some("") => return vec![">= 0".to_string()],
        Some(s) => s,
    };

    if RE_BARE_VERSION.is_match(spec) {
        return vec![format!(">= {}", spec)];
    }

    RE_CLAUSE_SPLIT
        .split(spec)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

/// Evaluate a whole specification against `have`.
///
/// Malformed clauses count as unsatisfied.
pub fn satisfies(have: &str, spec: Option<&str>) -> bool {
    parse_conditions(spec)
        .iter()
        .all(|clause| match Condition::parse(clause) {
            Some(cond) => cond.is_satisfied_by(have),
            None => {
                tracing::warn!("invalid version condition '{}'", clause);
                false
            }
        })
}
