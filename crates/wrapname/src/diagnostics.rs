//! Diagnostics emitted during name resolution.
//!
//! Name warnings are advisory: they are recorded here for the caller to
//! report, and never stop resolution. Each entry is also traced at debug
//! level; presenting them is left to the caller.

use serde::Serialize;

use crate::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, label, self.message),
            None => write!(f, "{}: {}", label, self.message),
        }
    }
}

/// Collected diagnostics for one pipeline run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, message: &str, location: Option<&Location>) {
        tracing::debug!("warning: {}", message);
        self.push(Severity::Warning, message, location);
    }

    pub fn error(&mut self, message: &str, location: Option<&Location>) {
        tracing::debug!("error: {}", message);
        self.push(Severity::Error, message, location);
    }

    fn push(&mut self, severity: Severity, message: &str, location: Option<&Location>) {
        self.entries.push(Diagnostic {
            severity,
            message: message.to_string(),
            location: location.cloned(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Drain the collected diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_with_location() {
        let mut diags = Diagnostics::new();
        let loc = Location::new(PathBuf::from("a.i"), 3);
        diags.warning("'print' is a keyword, renaming to '_print'", Some(&loc));
        assert_eq!(
            diags.entries()[0].to_string(),
            "a.i:3: Warning: 'print' is a keyword, renaming to '_print'"
        );
    }

    #[test]
    fn test_counts_and_take() {
        let mut diags = Diagnostics::new();
        diags.warning("w", None);
        diags.error("e", None);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.take().len(), 2);
        assert!(diags.is_empty());
    }
}
