//! Install destination resolution.
//!
//! - [`paths`] - Install types, install sets and default layouts
//! - [`prefixify`] - Relocating paths between prefixes
//! - [`resolver`] - Precedence rules and the `blib` install map

pub mod paths;
pub mod prefixify;
pub mod resolver;

pub use paths::{arch_name, InstallDirs, InstallType};
pub use prefixify::prefixify;
pub use resolver::{apply_destdir, InstallConfig};
