//! Error, warning, and validation types.
//!
//! Decode failures carry as much location context as the engine has at the
//! point of failure: a message, an optional 1-based line and column, an
//! optional snippet of the offending line, and an optional file path. The
//! [`Display`](std::fmt::Display) rendering interleaves those fields on
//! successive indented lines, so a failed parse prints like:
//!
//! ```text
//! Invalid value: @@@
//!   File: data.toon
//!   Location: line 12
//!   Snippet: @@@
//! ```
//!
//! Non-fatal anomalies (duplicate keys, ragged rows, declared-count
//! mismatches) accumulate as [`Warning`]s on the parser and are drained by
//! the caller after the top-level operation returns.

use std::fmt;
use thiserror::Error;

/// Alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failures the engine can surface.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Cannot open, read, or write the underlying source.
    #[error("IO error: {0}")]
    Io(String),

    /// Syntactic or semantic decode failure.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Value cannot be encoded (`NaN`/`Inf` under strict mode, or an
    /// unsupported value category).
    #[error("encode error: {0}")]
    Encode(String),

    /// The host's interrupt hook requested cancellation.
    #[error("operation cancelled by interrupt")]
    Cancelled,
}

impl Error {
    pub(crate) fn io(err: &std::io::Error) -> Self {
        Error::Io(err.to_string())
    }

    pub(crate) fn encode(msg: impl Into<String>) -> Self {
        Error::Encode(msg.into())
    }

    /// Returns `true` for the cancellation variant.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Attaches a source path to a parse error that lacks one.
    pub(crate) fn with_file(self, file: Option<&str>) -> Self {
        match (self, file) {
            (Error::Parse(pe), Some(f)) if pe.file().is_none() => {
                Error::Parse(pe.with_file(f))
            }
            (err, _) => err,
        }
    }
}

/// A decode failure with source location context.
///
/// Construct with [`ParseError::new`] and attach context with the builder
/// methods:
///
/// ```rust
/// use toonlite::ParseError;
///
/// let err = ParseError::new("Invalid value: @@@")
///     .at_line(12)
///     .with_snippet("@@@");
/// assert!(err.to_string().contains("line 12"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    line: Option<u32>,
    column: Option<u32>,
    snippet: Option<String>,
    file: Option<String>,
}

/// Snippets longer than this are truncated with a trailing ellipsis.
const SNIPPET_MAX: usize = 60;

impl ParseError {
    /// Creates a parse error with a bare message.
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            line: None,
            column: None,
            snippet: None,
            file: None,
        }
    }

    /// Attaches a 1-based line number.
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches a 1-based column number.
    #[must_use]
    pub fn at_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Attaches the offending line, truncated to about 60 characters.
    #[must_use]
    pub fn with_snippet(mut self, line: &str) -> Self {
        let snippet = if line.chars().count() > SNIPPET_MAX {
            let cut: String = line.chars().take(SNIPPET_MAX - 3).collect();
            format!("{cut}...")
        } else {
            line.to_string()
        };
        self.snippet = Some(snippet);
        self
    }

    /// Attaches the source file path.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// The bare message, without location context.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line number, if the reader had advanced when the failure
    /// occurred.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// 1-based column number, when a specific position is known.
    #[must_use]
    pub fn column(&self) -> Option<u32> {
        self.column
    }

    /// The offending line, truncated.
    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    /// Source file path, when the input came from a file.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(file) = &self.file {
            write!(f, "\n  File: {file}")?;
        }
        if let Some(line) = self.line {
            write!(f, "\n  Location: line {line}")?;
            if let Some(column) = self.column {
                write!(f, ", column {column}")?;
            }
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n  Snippet: {snippet}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Parse(ParseError::new(msg.to_string()))
    }
}

/// Category of a non-fatal decode anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A key appeared more than once in one object; the last occurrence won.
    DuplicateKey,
    /// Tabular rows had inconsistent field counts.
    RaggedRows,
    /// A declared `[N]` did not match the observed item or row count.
    CountMismatch,
    /// A pinned column type could not absorb some tokens; they became NA.
    ForceType,
    /// Anything else.
    Other,
}

/// A non-fatal anomaly recorded during a decode.
///
/// Warnings are aggregated — one per category per call — and carry a
/// human-readable message with the relevant counts already folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub(crate) fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Warning {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of a validation pass.
///
/// Validation never fails for syntactic reasons — a malformed document is a
/// `valid == false` result, not an error. Only I/O failures while reading
/// the input surface as [`Error`]s from the validation entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub snippet: Option<String>,
    pub file: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub fn ok() -> Self {
        ValidationResult {
            valid: true,
            message: None,
            line: None,
            column: None,
            snippet: None,
            file: None,
        }
    }

    /// A failing result carrying the parse failure's location context.
    #[must_use]
    pub fn invalid(err: &ParseError) -> Self {
        ValidationResult {
            valid: false,
            message: Some(err.message().to_string()),
            line: err.line(),
            column: err.column(),
            snippet: err.snippet().map(str::to_string),
            file: err.file().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_renders_location_on_indented_lines() {
        let err = ParseError::new("Invalid value: @@@")
            .at_line(12)
            .at_column(3)
            .with_snippet("@@@")
            .with_file("data.toon");
        let rendered = err.to_string();
        assert!(rendered.starts_with("Invalid value: @@@"));
        assert!(rendered.contains("\n  File: data.toon"));
        assert!(rendered.contains("\n  Location: line 12, column 3"));
        assert!(rendered.contains("\n  Snippet: @@@"));
    }

    #[test]
    fn snippet_is_truncated_with_ellipsis() {
        let long = "x".repeat(100);
        let err = ParseError::new("bad").with_snippet(&long);
        let snippet = err.snippet().unwrap();
        assert_eq!(snippet.chars().count(), 60);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn validation_result_copies_error_fields() {
        let err = ParseError::new("boom").at_line(4);
        let vr = ValidationResult::invalid(&err);
        assert!(!vr.valid);
        assert_eq!(vr.message.as_deref(), Some("boom"));
        assert_eq!(vr.line, Some(4));
        assert_eq!(vr.column, None);
    }
}
