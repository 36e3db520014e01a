//! modbuild - Action-based build orchestration for software distributions.
//!
//! A distribution declares its properties in `modbuild.yml`; a [`Builder`]
//! merges them with the defaults of its build classes and dispatches named
//! actions such as `build`, `test` and `install`. Each action runs at most
//! once per dispatch no matter how many other actions depend on it, and is
//! gated on its declared prerequisites.
//!
//! # Modules
//!
//! - [`actions`] - Action registry, dispatch context and the standard actions
//! - [`builder`] - The build orchestrator
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration file discovery and loading
//! - [`error`] - Error types and result aliases
//! - [`freshness`] - Modification-time staleness checks
//! - [`install`] - Install destination resolution
//! - [`prereqs`] - Prerequisite checking
//! - [`properties`] - Typed, layered configuration properties
//! - [`state`] - Persisted configuration checkpoints
//! - [`toolchain`] - Compiler, archiver and shell collaborators
//! - [`ui`] - Terminal output
//! - [`version`] - Version comparison and constraint specifications
//!
//! # Example
//!
//! ```
//! use modbuild::version::{compare, satisfies};
//!
//! assert!(compare("1.23_04", ">=", "1.23"));
//! assert!(satisfies("1.5", Some(">= 1.0, < 2.0")));
//! assert!(!satisfies("2.0", Some(">= 1.0, < 2.0")));
//! ```
//!
//! For dispatching against a distribution on disk, see the integration tests.

pub mod actions;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod freshness;
pub mod install;
pub mod prereqs;
pub mod properties;
pub mod state;
pub mod toolchain;
pub mod ui;
pub mod version;

pub use builder::{Builder, BuilderOptions};
pub use error::{BuildError, Result};
