//! # toonlite
//!
//! Reader, writer, validator, and row streamer for **TOON**
//! (Token-Oriented Object Notation) — a line-oriented,
//! indentation-sensitive format combining nested records, heterogeneous
//! arrays, and a compact tabular form for rectangular data. The format
//! itself is documented in the [`spec`] module.
//!
//! ## Reading
//!
//! ```rust
//! use toonlite::{from_str, Value};
//!
//! let value = from_str("name: \"Alice\"\nage: 30").unwrap();
//! let obj = value.as_object().unwrap();
//! assert_eq!(obj.get("age"), Some(&Value::Int(30)));
//! ```
//!
//! Typed reads go through serde:
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct User { name: String, age: i64 }
//!
//! let value = toonlite::from_str("name: \"Alice\"\nage: 30").unwrap();
//! let user: User = toonlite::from_value(value).unwrap();
//! assert_eq!(user.age, 30);
//! ```
//!
//! ## Writing
//!
//! ```rust
//! use serde::Serialize;
//! use toonlite::to_string;
//!
//! #[derive(Serialize)]
//! struct Point { x: i64, y: i64 }
//!
//! assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "x: 1\ny: 2");
//! ```
//!
//! ## Tables
//!
//! Rectangular data skips the DOM entirely: [`read_table`] decodes a
//! tabular block straight into typed columns with NA support, and
//! [`stream_rows`] feeds fixed-size batches to a consumer without
//! materializing the whole file.
//!
//! ```rust
//! use toonlite::{table_from_str, ColType, TabularOptions};
//!
//! let text = "[2]{id,name}:\n  1, \"a\"\n  2, \"b\"\n";
//! let table = table_from_str(text, &TabularOptions::new()).unwrap();
//! assert_eq!(table.n_rows(), 2);
//! assert_eq!(table.column(0).unwrap().col_type(), ColType::Integer);
//! ```
//!
//! ## Errors and warnings
//!
//! Fatal problems surface as [`Error`]; recoverable anomalies (duplicate
//! keys, ragged rows, declared-count mismatches) accumulate as
//! [`Warning`]s. The convenience functions here log warnings through
//! `tracing`; use [`Parser`], [`TableReader`], or [`RowStreamer`]
//! directly to collect them.

pub mod de;
pub mod error;
pub mod inspect;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod spec;
pub mod stream;
pub mod table;
pub mod tabular;
pub mod value;

mod line;
mod read;

pub use de::{from_value, Parser};
pub use error::{Error, ParseError, Result, ValidationResult, Warning, WarningKind};
pub use inspect::{DocKind, Info, Peek};
pub use map::Map;
pub use options::{
    ColType, CountMismatch, EncodeOptions, InterruptHook, ParseOptions, RaggedRows,
    StreamOptions, TabularOptions,
};
pub use ser::{to_value, Encoder, ValueSerializer};
pub use stream::{RowStreamer, StreamWriter};
pub use table::{Column, Table};
pub use tabular::TableReader;
pub use value::Value;

use serde::Serialize;
use std::path::Path;

fn emit_warnings(warnings: &[Warning]) {
    for warning in warnings {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
    }
}

/// Parses a TOON document with default options. Empty input is
/// [`Value::Null`]. Warnings are logged through `tracing`.
///
/// # Errors
///
/// Returns [`Error::Parse`] on malformed input.
pub fn from_str(text: &str) -> Result<Value> {
    from_str_with_options(text, &ParseOptions::default())
}

/// Parses a TOON document with explicit options.
pub fn from_str_with_options(text: &str, opts: &ParseOptions) -> Result<Value> {
    let mut parser = Parser::new(opts.clone());
    let value = parser.parse_str(text)?;
    emit_warnings(parser.warnings());
    Ok(value)
}

/// Parses a TOON document from bytes (must be UTF-8).
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    let mut parser = Parser::new(ParseOptions::default());
    let value = parser.parse_slice(bytes)?;
    emit_warnings(parser.warnings());
    Ok(value)
}

/// Parses a TOON file with default options.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened, [`Error::Parse`]
/// on malformed input.
pub fn from_file(path: impl AsRef<Path>) -> Result<Value> {
    from_file_with_options(path, &ParseOptions::default())
}

/// Parses a TOON file with explicit options.
pub fn from_file_with_options(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<Value> {
    let mut parser = Parser::new(opts.clone());
    let value = parser.parse_file(path.as_ref())?;
    emit_warnings(parser.warnings());
    Ok(value)
}

/// Encodes any `T: Serialize` as TOON text with default options.
///
/// # Errors
///
/// Returns [`Error::Encode`] for `NaN`/`Inf` under strict mode or values
/// the format cannot express.
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::default())
}

/// Encodes any `T: Serialize` as TOON text with explicit options.
pub fn to_string_with_options<T>(value: &T, opts: &EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let value = to_value(value)?;
    Encoder::new(opts.clone()).encode(&value)
}

/// Validates TOON text. Syntactic failures come back inside the
/// [`ValidationResult`]; this never errors.
#[must_use]
pub fn validate_str(text: &str, opts: &ParseOptions) -> ValidationResult {
    Parser::new(opts.clone()).validate_str(text)
}

/// Validates a TOON file. Only I/O failures surface as `Err`.
pub fn validate_file(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<ValidationResult> {
    Parser::new(opts.clone()).validate_file(path.as_ref())
}

/// Decodes the first (or keyed) tabular block of a file into a
/// [`Table`]. Warnings are logged through `tracing`.
pub fn read_table(path: impl AsRef<Path>, opts: &TabularOptions) -> Result<Table> {
    let mut reader = TableReader::new(opts.clone());
    let table = reader.read_file(path.as_ref())?;
    emit_warnings(reader.warnings());
    Ok(table)
}

/// Decodes the first (or keyed) tabular block of a string into a
/// [`Table`].
pub fn table_from_str(text: &str, opts: &TabularOptions) -> Result<Table> {
    let mut reader = TableReader::new(opts.clone());
    let table = reader.read_str(text)?;
    emit_warnings(reader.warnings());
    Ok(table)
}

/// Writes a table to `path` as a tabular block.
pub fn write_table(
    table: &Table,
    path: impl AsRef<Path>,
    opts: &EncodeOptions,
) -> Result<()> {
    let mut text = Encoder::new(opts.clone()).encode_table(table)?;
    text.push('\n');
    std::fs::write(path.as_ref(), text).map_err(|e| Error::io(&e))
}

/// Streams a file's tabular block to `consumer` in batches of
/// `opts.batch_size` rows. End-of-stream warnings are logged after the
/// final batch.
pub fn stream_rows<F>(path: impl AsRef<Path>, opts: &StreamOptions, consumer: F) -> Result<()>
where
    F: FnMut(Table) -> Result<()>,
{
    let mut streamer = RowStreamer::open(path.as_ref(), opts.clone())?;
    streamer.stream(consumer)?;
    emit_warnings(streamer.warnings());
    Ok(())
}

/// Parses and re-encodes TOON text in normalized form. Formatting is
/// idempotent: `format_str(format_str(x)) == format_str(x)`.
pub fn format_str(text: &str, opts: &EncodeOptions) -> Result<String> {
    let parse_opts = ParseOptions::default().with_simplify(false);
    let value = Parser::new(parse_opts).parse_str(text)?;
    Encoder::new(opts.clone()).encode(&value)
}

/// Parses and re-encodes a TOON file in normalized form.
pub fn format_file(path: impl AsRef<Path>, opts: &EncodeOptions) -> Result<String> {
    let parse_opts = ParseOptions::default().with_simplify(false);
    let value = Parser::new(parse_opts).parse_file(path.as_ref())?;
    Encoder::new(opts.clone()).encode(&value)
}

/// Reads at most `n` lines of a file and reports its apparent shape.
pub fn peek(path: impl AsRef<Path>, n: usize, allow_comments: bool) -> Result<Peek> {
    inspect::peek(path.as_ref(), n, allow_comments)
}

/// Fully parses a file and reports structural counts.
pub fn info(path: impl AsRef<Path>, allow_comments: bool) -> Result<Info> {
    inspect::info(path.as_ref(), allow_comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_encode_smoke() {
        let value = from_str("x: 1\ny: \"two\"").unwrap();
        let text = to_string(&value).unwrap();
        assert_eq!(text, "x: 1\ny: \"two\"");
        assert_eq!(from_str(&text).unwrap(), value);
    }

    #[test]
    fn validate_does_not_raise() {
        assert!(validate_str("a: 1", &ParseOptions::default()).valid);
        assert!(!validate_str("k:\n  @@@", &ParseOptions::default()).valid);
    }

    #[test]
    fn format_normalizes_and_is_idempotent() {
        let input = "b:   1\na:    \"x\"   # note\n";
        let once = format_str(input, &EncodeOptions::default()).unwrap();
        let twice = format_str(&once, &EncodeOptions::default()).unwrap();
        assert_eq!(once, "b: 1\na: \"x\"");
        assert_eq!(once, twice);
    }
}
