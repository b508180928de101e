//! Diagnostic rendering for the end-of-run report.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders a batch followed by a one-line count summary.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diag in diags {
            out.push_str(&self.render(diag));
        }
        let errors = diags.iter().filter(|d| d.severity == Severity::Error).count();
        let warnings = diags
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
        out
    }
}

/// Renders diagnostics in a rustc-like terminal format.
///
/// ```text
/// warning[W202]: cannot legalize instance
///   --> u_core/inv_12 at (1200, 3400)
///    = blocking: u_core/nand_7
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in the header.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let severity = if self.color {
            let color = match diag.severity {
                Severity::Error => "31",
                Severity::Warning => "33",
                Severity::Note => "36",
            };
            format!("\x1b[1;{color}m{}\x1b[0m", diag.severity)
        } else {
            diag.severity.to_string()
        };
        format!("{severity}[{}]: {}\n", diag.code, diag.message)
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = self.header(diag);

        if !diag.location.is_none() {
            out.push_str(&format!("  --> {}\n", diag.location));
        }

        for label in &diag.labels {
            let marker = match label.style {
                LabelStyle::Primary => "^",
                LabelStyle::Secondary => "-",
            };
            out.push_str(&format!("   {marker} {}: {}\n", label.message, label.location));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}
