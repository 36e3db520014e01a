//! Version constraints and comparison.
//!
//! - [`compare`] - Numeric version comparison with alpha-suffix folding
//! - [`conditions`] - Constraint specification parsing

pub mod compare;
pub mod conditions;

pub use compare::{compare, compare_with, is_zero, normalize_alpha, numify, VersionOp};
pub use conditions::{parse_conditions, satisfies, Condition};
