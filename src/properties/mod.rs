//! Typed, layered configuration properties.
//!
//! - [`value`] - The [`PropertyValue`] type
//! - [`registry`] - Defaults registered per build class
//! - [`instance`] - Per-builder values, argument merging and scoped overrides
//! - [`args`] - Invocation argument parsing

pub mod args;
pub mod instance;
pub mod registry;
pub mod value;

pub use args::{parse_invocation, ArgKind, InvocationArgs};
pub use instance::{OverrideGuard, Properties, SavedProperties};
pub use registry::{PropertyLayer, PropertyRegistry};
pub use value::PropertyValue;
