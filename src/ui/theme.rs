//! Output styling.

use console::Style;

/// Styles used by action output.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Satisfied prerequisites (green).
    pub success: Style,
    /// Recommendation gaps (orange).
    pub warning: Style,
    /// Violated prerequisites (red bold).
    pub error: Style,
    /// Secondary text.
    pub dim: Style,
    /// Section headers (magenta bold).
    pub header: Style,
    /// Action names and other labels (bold).
    pub key: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            header: Style::new().bold().magenta(),
            key: Style::new().bold(),
        }
    }

    /// A theme without colors.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            header: Style::new(),
            key: Style::new(),
        }
    }

    /// Colored when stdout is a terminal.
    pub fn for_stdout() -> Self {
        if console::colors_enabled() {
            Self::new()
        } else {
            Self::plain()
        }
    }
}
