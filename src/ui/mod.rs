//! Terminal output for actions that print reports.

pub mod table;
pub mod theme;

pub use table::Table;
pub use theme::Theme;
