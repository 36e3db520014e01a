//! Prerequisite checking.
//!
//! - [`status`] - Result types for one dependency check
//! - [`inspector`] - Finding installed dependencies and their versions
//! - [`checker`] - Evaluating buckets and gating actions
//! - [`report`] - Rendering failures for humans

pub mod checker;
pub mod inspector;
pub mod report;
pub mod status;

pub use checker::{PrereqChecker, Prerequisites, LEGACY_ACTION};
pub use inspector::{
    extract_version, ModuleInspector, ModuleLookup, ResidentModules, RuntimeIdentity,
    SearchPathInspector,
};
pub use report::Severity;
pub use status::{
    Installed, InstalledStatus, PrereqFailures, PrereqKind, PrereqScope, NOT_INSTALLED,
};
