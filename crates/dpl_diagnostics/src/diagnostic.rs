//! Structured diagnostic messages anchored to die locations.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use dpl_common::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where on the die a diagnostic applies.
///
/// Either part may be absent; [`Location::NONE`] is used for design-wide
/// messages such as verification summaries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the instance, row, or group involved.
    pub object: Option<String>,
    /// A point on the die, in DBU.
    pub point: Option<Point>,
}

impl Location {
    /// A location that points nowhere.
    pub const NONE: Location = Location {
        object: None,
        point: None,
    };

    /// A location naming an object without coordinates.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            object: Some(name.into()),
            point: None,
        }
    }

    /// A location naming an object at a point.
    pub fn at(name: impl Into<String>, point: Point) -> Self {
        Self {
            object: Some(name.into()),
            point: Some(point),
        }
    }

    /// Returns `true` if neither an object nor a point is set.
    pub fn is_none(&self) -> bool {
        self.object.is_none() && self.point.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.object, self.point) {
            (Some(name), Some(pt)) => write!(f, "{name} at {pt}"),
            (Some(name), None) => write!(f, "{name}"),
            (None, Some(pt)) => write!(f, "{pt}"),
            (None, None) => Ok(()),
        }
    }
}

/// A structured diagnostic message.
///
/// Each diagnostic includes a severity, a stable code, a message and a
/// primary location, plus optional labels, notes, and help text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The primary location where the issue was detected.
    pub location: Location,
    /// Additional annotated locations providing context.
    pub labels: Vec<Label>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::with_severity(Severity::Error, code, message, location)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::with_severity(Severity::Warning, code, message, location)
    }

    /// Creates a new informational note.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::with_severity(Severity::Note, code, message, location)
    }

    /// Adds a label to this diagnostic.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}
