//! Command-line interface for modbuild.
//!
//! - [`args`] - Argument definitions using clap's derive macros
//! - [`run`] - Resolving the distribution and dispatching the action

pub mod args;
pub mod run;

pub use args::Cli;
pub use run::Invocation;
