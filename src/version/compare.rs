//! Numeric version comparison.
//!
//! Versions are compared as decimal numbers, not as semantic versions.
//! A trailing `_<digits>` alpha marker is folded into the number before
//! coercion, so `1.23_04` compares as `1.2304`. Only the leading numeric
//! part of an operand takes part in the comparison; `1.2.3` compares as
//! `1.2`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static RE_ALPHA_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)$").expect("valid alpha suffix regex"));

static RE_NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)").expect("valid numeric regex"));

/// A comparison operator in a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl VersionOp {
    /// The operator as written in a constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOp::Lt => "<",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Ge => ">=",
            VersionOp::Eq => "==",
            VersionOp::Ne => "!=",
        }
    }

    fn holds(&self, have: f64, need: f64) -> bool {
        match self {
            VersionOp::Lt => have < need,
            VersionOp::Le => have <= need,
            VersionOp::Gt => have > need,
            VersionOp::Ge => have >= need,
            VersionOp::Eq => have == need,
            VersionOp::Ne => have != need,
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(VersionOp::Lt),
            "<=" => Ok(VersionOp::Le),
            ">" => Ok(VersionOp::Gt),
            ">=" => Ok(VersionOp::Ge),
            "==" => Ok(VersionOp::Eq),
            "!=" => Ok(VersionOp::Ne),
            other => Err(format!("unknown version operator '{}'", other)),
        }
    }
}

/// Fold a trailing `_<digits>` alpha marker into the version number.
pub fn normalize_alpha(version: &str) -> Cow<'_, str> {
    RE_ALPHA_SUFFIX.replace(version.trim(), "$1")
}

/// Coerce a version string to a number.
///
/// Returns `None` when the string has no leading numeric part.
pub fn numify(version: &str) -> Option<f64> {
    let normalized = normalize_alpha(version);
    let captures = RE_NUMERIC_PREFIX.captures(&normalized)?;
    let numeric = captures.get(1)?.as_str();

    if numeric.len() != normalized.len() {
        tracing::debug!(
            "version '{}' is not purely numeric, comparing as {}",
            version,
            numeric
        );
    }

    numeric.parse().ok()
}

/// Compare `have` against `need` using an operator given as text.
///
/// Malformed operands or operators produce a warning and a failed
/// comparison rather than an error.
pub fn compare(have: &str, op: &str, need: &str) -> bool {
    match op.parse::<VersionOp>() {
        Ok(op) => compare_with(have, op, need),
        Err(e) => {
            tracing::warn!("error comparing versions: '{} {} {}': {}", have, op, need, e);
            false
        }
    }
}

/// Compare `have` against `need` using a parsed operator.
pub fn compare_with(have: &str, op: VersionOp, need: &str) -> bool {
    let (Some(h), Some(n)) = (numify(have), numify(need)) else {
        tracing::warn!(
            "error comparing versions: '{} {} {}': not a numeric version",
            have,
            op,
            need
        );
        return false;
    };
    op.holds(h, n)
}

/// Whether a version is numerically zero (e.g. `0`, `0.0`, `0_00`).
pub fn is_zero(version: &str) -> bool {
    numify(version).is_some_and(|v| v == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_operators() {
        for (text, op) in [
            ("<", VersionOp::Lt),
            ("<=", VersionOp::Le),
            (">", VersionOp::Gt),
            (">=", VersionOp::Ge),
            ("==", VersionOp::Eq),
            ("!=", VersionOp::Ne),
        ] {
            assert_eq!(text.parse::<VersionOp>().unwrap(), op);
            assert_eq!(op.to_string(), text);
        }
    }

    #[test]
    fn rejects_unknown_operator() {
        assert!("=~".parse::<VersionOp>().is_err());
        assert!(!compare("1.0", "=~", "1.0"));
    }

    #[test]
    fn alpha_suffix_is_folded() {
        assert_eq!(normalize_alpha("1.23_04"), "1.2304");
        assert_eq!(normalize_alpha("1.23"), "1.23");
        assert_eq!(numify("1.23_04"), Some(1.2304));
    }

    #[test]
    fn numeric_comparisons() {
        assert!(compare("1.10", ">", "1.09"));
        assert!(compare("1.5", ">=", "1.5"));
        assert!(compare("0.99", "<", "1"));
        assert!(compare("2", "<=", "2.0"));
        assert!(compare("1.0", "==", "1"));
        assert!(compare("1.01", "!=", "1.1"));
    }

    #[test]
    fn decimal_not_semver() {
        // 1.10 is 1.1 as a number, not "version ten"
        assert!(compare("1.10", "==", "1.1"));
        assert!(!compare("1.10", ">", "1.9"));
    }

    #[test]
    fn alpha_versions_compare_after_normalization() {
        assert!(compare("1.23_04", ">", "1.23"));
        assert!(compare("1.23_04", "<", "1.24"));
        assert!(compare("0.50_01", "==", "0.5001"));
    }

    #[test]
    fn dotted_versions_use_leading_number() {
        assert_eq!(numify("1.2.3"), Some(1.2));
        assert!(compare("1.2.3", "==", "1.2"));
    }

    #[test]
    fn malformed_operands_fail_the_comparison() {
        assert!(!compare("abc", ">=", "1.0"));
        assert!(!compare("1.0", ">=", "xyz"));
        assert!(!compare("", "<", "1.0"));
        assert!(!compare("abc", "!=", "1.0"));
    }

    #[test]
    fn zero_detection() {
        assert!(is_zero("0"));
        assert!(is_zero("0.000"));
        assert!(!is_zero("0.001"));
        assert!(!is_zero("abc"));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!(compare(" 1.5 ", ">", " 1.4"));
    }
}
