//! Cheap file inspection: [`peek`] and [`info`].
//!
//! `peek` reads at most `n` lines and guesses the document's top-level
//! shape without building a DOM; `info` does a full parse and reports
//! structural counts. Both are meant for interactive "what is this file"
//! moments before committing to a real decode.

use std::path::Path;

use crate::de::Parser;
use crate::options::ParseOptions;
use crate::read::LineReader;
use crate::{Result, Value};

/// Guessed top-level shape of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Object,
    Array,
    TabularArray,
    Unknown,
}

/// Result of [`peek`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peek {
    pub kind: DocKind,
    /// Up to five top-level keys, when the document is an object.
    pub first_keys: Vec<String>,
    /// The first `n` raw lines.
    pub preview: Vec<String>,
}

/// Result of [`info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    /// Number of arrays anywhere in the document.
    pub arrays: usize,
    /// Number of objects anywhere in the document.
    pub objects: usize,
    /// Whether any array is tabular-shaped (every item an object).
    pub has_tabular: bool,
    /// Row count of the tabular array, when one exists.
    pub declared_rows: Option<usize>,
}

const MAX_FIRST_KEYS: usize = 5;

/// Reads at most `n` lines of `path` and reports the document's apparent
/// shape, its leading top-level keys, and the raw preview lines.
pub fn peek(path: &Path, n: usize, allow_comments: bool) -> Result<Peek> {
    let mut reader = LineReader::open(path)?;
    let mut preview = Vec::new();
    let mut kind = DocKind::Unknown;
    let mut first_keys = Vec::new();

    while preview.len() < n {
        let Some((text, _)) = reader.next_line()? else {
            break;
        };
        preview.push(text.to_string());

        let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
        let content = text[indent..].trim();
        if content.is_empty()
            || (allow_comments && (content.starts_with('#') || content.starts_with("//")))
        {
            continue;
        }

        if kind == DocKind::Unknown {
            kind = if content.starts_with('[') {
                if content.contains('{') {
                    DocKind::TabularArray
                } else {
                    DocKind::Array
                }
            } else if content.starts_with('-') {
                DocKind::Array
            } else if content.contains(':') {
                DocKind::Object
            } else {
                DocKind::Unknown
            };
        }

        if kind == DocKind::Object && indent == 0 && first_keys.len() < MAX_FIRST_KEYS {
            if let Some(colon) = content.find(':') {
                let key = content[..colon].trim();
                if !key.is_empty() {
                    first_keys.push(key.trim_matches('"').to_string());
                }
            }
        }
    }

    Ok(Peek {
        kind,
        first_keys,
        preview,
    })
}

/// Parses `path` completely and reports structural counts.
pub fn info(path: &Path, allow_comments: bool) -> Result<Info> {
    // Keep tabular blocks as arrays of row objects so the counts reflect
    // the document's written structure.
    let opts = ParseOptions::new()
        .with_simplify(false)
        .with_comments(allow_comments);
    let value = Parser::new(opts).parse_file(path)?;

    let mut info = Info {
        arrays: 0,
        objects: 0,
        has_tabular: false,
        declared_rows: None,
    };
    count_nodes(&value, &mut info);
    Ok(info)
}

fn count_nodes(value: &Value, info: &mut Info) {
    match value {
        Value::Array(items) => {
            info.arrays += 1;
            if !items.is_empty() && items.iter().all(Value::is_object) {
                info.has_tabular = true;
                info.declared_rows = Some(items.len());
            }
            for item in items {
                count_nodes(item, info);
            }
        }
        Value::Object(map) => {
            info.objects += 1;
            for (_, child) in map.iter() {
                count_nodes(child, info);
            }
        }
        Value::Table(table) => {
            info.arrays += 1;
            info.has_tabular = true;
            info.declared_rows = Some(table.n_rows());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn peek_reports_object_shape_and_keys() {
        let tmp = write_file("# header\nname: 1\nage: 2\nnested:\n  x: 1\n");
        let peeked = peek(tmp.path(), 3, true).unwrap();
        assert_eq!(peeked.kind, DocKind::Object);
        assert_eq!(peeked.first_keys, vec!["name", "age"]);
        assert_eq!(peeked.preview.len(), 3);
    }

    #[test]
    fn peek_reports_tabular_shape() {
        let tmp = write_file("[2]{a,b}:\n  1, 2\n  3, 4\n");
        let peeked = peek(tmp.path(), 10, true).unwrap();
        assert_eq!(peeked.kind, DocKind::TabularArray);
        assert!(peeked.first_keys.is_empty());
    }

    #[test]
    fn peek_stops_at_n_lines() {
        let tmp = write_file("- 1\n- 2\n- 3\n- 4\n");
        let peeked = peek(tmp.path(), 2, true).unwrap();
        assert_eq!(peeked.kind, DocKind::Array);
        assert_eq!(peeked.preview, vec!["- 1", "- 2"]);
    }

    #[test]
    fn info_counts_structure() {
        let tmp = write_file("users: [2]{id}:\n  1\n  2\nmeta:\n  version: 1\n");
        let got = info(tmp.path(), true).unwrap();
        assert_eq!(got.objects, 4); // root, meta, two row objects
        assert_eq!(got.arrays, 1);
        assert!(got.has_tabular);
        assert_eq!(got.declared_rows, Some(2));
    }
}
