//! Human-readable prerequisite failure reports.

use std::fmt;

use super::status::{PrereqFailures, PrereqKind, PrereqScope};

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Recommendations only warn; everything else is an error.
    pub fn for_kind(kind: PrereqKind) -> Self {
        match kind {
            PrereqKind::Recommends => Severity::Warning,
            PrereqKind::Requires | PrereqKind::Conflicts => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// Render failures one line per violation:
/// `<SEVERITY>: [<bucket>] <message>`.
pub fn render(failures: &PrereqFailures) -> String {
    let mut lines = Vec::new();
    for (bucket, modules) in failures {
        let severity = bucket
            .parse::<PrereqScope>()
            .map(|scope| Severity::for_kind(scope.kind))
            .unwrap_or(Severity::Error);
        for (module, status) in modules {
            let message = status.message.as_deref().unwrap_or(module);
            lines.push(format!("{}: [{}] {}", severity, bucket, message));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prereqs::status::InstalledStatus;

    fn failure(module: &str, message: &str) -> InstalledStatus {
        let mut status = InstalledStatus::new(module, "1.0");
        status.message = Some(message.to_string());
        status
    }

    #[test]
    fn one_line_per_violation_with_severity() {
        let mut failures = PrereqFailures::new();
        failures
            .entry("requires".into())
            .or_default()
            .insert("Foo".into(), failure("Foo", "Foo is not installed"));
        failures
            .entry("test_recommends".into())
            .or_default()
            .insert("Bar".into(), failure("Bar", "Bar is not installed"));

        assert_eq!(
            render(&failures),
            "ERROR: [requires] Foo is not installed\n\
             WARNING: [test_recommends] Bar is not installed"
        );
    }

    #[test]
    fn recommendations_alone_are_not_errors() {
        let mut failures = PrereqFailures::new();
        failures
            .entry("recommends".into())
            .or_default()
            .insert("Bar".into(), failure("Bar", "Bar is not installed"));
        assert_eq!(render(&failures), "WARNING: [recommends] Bar is not installed");
    }
}
