//! Actions and their dispatch.
//!
//! - [`registry`] - Action names and handlers
//! - [`context`] - Per-dispatch state: the completed set and `depends_on`
//! - [`classes`] - Build classes contributing properties and actions
//! - [`builtin`] - The standard actions
//! - [`files`] - File staging helpers used by the standard actions

pub mod builtin;
pub mod classes;
pub mod context;
pub mod files;
pub mod registry;

pub use classes::{default_classes, BuildClass, CoreClass, UnixClass, WindowsClass};
pub use context::ActionContext;
pub use registry::{is_valid_action_name, Action, ActionHandler, ActionRegistry};
