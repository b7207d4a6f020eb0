//! Core types for diagnostics and check results.

use miette::SourceSpan;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Stylistic or advisory finding, does not fail a check.
    Suggestion,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suggestion => write!(f, "suggestion"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suggestion" => Ok(Self::Suggestion),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(UnknownSeverity {
                name: other.to_string(),
            }),
        }
    }
}

/// Error for severity names outside suggestion/warning/error.
#[derive(Debug, thiserror::Error)]
#[error("unknown severity `{name}`; valid values: suggestion, warning, error")]
pub struct UnknownSeverity {
    /// The rejected name.
    pub name: String,
}

/// A source region within one compilation unit.
///
/// Offsets are byte positions into the unit's source text; line and column
/// are 1-indexed and refer to the start of the span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte of the span.
    pub start: usize,
    /// Byte offset one past the last byte of the span.
    pub end: usize,
    /// Line of the span start (1-indexed).
    pub line: usize,
    /// Column of the span start (1-indexed).
    pub column: usize,
}

impl Span {
    /// Creates a span from explicit values.
    #[must_use]
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span covers zero bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A suggested remedy for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
    /// Optional automatic replacement.
    pub replacement: Option<Replacement>,
}

impl Suggestion {
    /// Creates a suggestion without an automatic fix.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replacement: None,
        }
    }

    /// Creates a suggestion with an automatic fix.
    #[must_use]
    pub fn with_fix(message: impl Into<String>, replacement: Replacement) -> Self {
        Self {
            message: message.into(),
            replacement: Some(replacement),
        }
    }
}

/// An automatic textual replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Region to replace.
    pub span: Span,
    /// New text to insert.
    pub new_text: String,
}

impl Replacement {
    /// Creates a new replacement.
    #[must_use]
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }
}

/// A finding produced by one rule at one source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the rule that produced this diagnostic.
    pub rule: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// File the finding is in.
    pub file: PathBuf,
    /// Region the finding covers.
    pub span: Span,
    /// Rendered message.
    pub message: String,
    /// Optional suggested remedy.
    pub suggestion: Option<Suggestion>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        file: impl Into<PathBuf>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            file: file.into(),
            span,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attaches a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file.display(),
            self.span.line,
            self.span.column,
            self.severity,
            self.rule,
            self.message
        )
    }
}

/// Converts a [`Diagnostic`] into a miette diagnostic for rich display.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{message}")]
pub struct RenderedDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{rule}")]
    span: SourceSpan,
    rule: String,
}

impl From<&Diagnostic> for RenderedDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        Self {
            message: format!("[{}] {}", d.rule, d.message),
            help: d.suggestion.as_ref().map(|s| s.message.clone()),
            span: SourceSpan::from((d.span.start, d.span.len())),
            rule: d.rule.clone(),
        }
    }
}

/// Aggregate result of checking one or more compilation units.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CheckReport {
    /// All diagnostics found, sorted by file, line, column.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of compilation units checked.
    pub units_checked: usize,
    /// Total nodes visited across all units.
    pub nodes_visited: usize,
    /// Matcher faults that were isolated and skipped.
    pub matcher_faults: usize,
}

impl CheckReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_diagnostics_at(Severity::Error)
    }

    /// Returns true if any diagnostic meets or exceeds `severity`.
    #[must_use]
    pub fn has_diagnostics_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Counts diagnostics by severity: `(errors, warnings, suggestions)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for d in &self.diagnostics {
            match d.severity {
                Severity::Error => counts.0 += 1,
                Severity::Warning => counts.1 += 1,
                Severity::Suggestion => counts.2 += 1,
            }
        }
        counts
    }

    /// Merges another report into this one.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.units_checked += other.units_checked;
        self.nodes_visited += other.nodes_visited;
        self.matcher_faults += other.matcher_faults;
    }

    /// Formats all diagnostics at or above `fail_on` as a multi-line report.
    #[must_use]
    pub fn format_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(report, "\n=== treelint: {} finding(s) ===\n", failing.len());

        for d in &failing {
            let _ = writeln!(report, "{d}");
            if let Some(suggestion) = &d.suggestion {
                let _ = writeln!(report, "  = help: {}", suggestion.message);
            }
        }

        let (errors, warnings, suggestions) = self.count_by_severity();
        let _ = writeln!(
            report,
            "\nTotal: {} error(s), {} warning(s), {} suggestion(s) in {} unit(s)",
            errors, warnings, suggestions, self.units_checked
        );

        report
    }
}
