//! Line classification and token scanning.
//!
//! Everything that looks at raw text lives here: indentation counting,
//! comment stripping, the array-header grammar, primitive classification,
//! quoted-string unescaping, and quote-aware row splitting. The DOM
//! parser, the tabular decoder, the row streamer, and the validator all
//! share these rules, which is what keeps their notions of the format in
//! agreement.

use crate::error::ParseError;
use crate::options::ParseOptions;
use crate::{Error, Result, Value};

/// What a classified line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Empty,
    Comment,
    /// `- value`, or a bare `-` introducing a nested value.
    ListItem,
    /// `key: value`
    KeyValue,
    /// `key:` followed by a nested block.
    KeyNested,
    /// `[N]:`
    ArrayHeader,
    /// `[N]{f1,f2}:`
    TabularHeader,
    /// A bare primitive.
    RawValue,
}

/// Parsed form of `[N]:` / `[N]{f1,f2}:`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ArrayHeader {
    /// Declared item or row count; 0 means "not declared".
    pub declared: usize,
    pub fields: Vec<String>,
    pub tabular: bool,
}

/// One classified line. Owns its text so it can sit in the parser's peek
/// buffer after the reader has moved on.
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub kind: LineKind,
    pub indent: usize,
    pub line_no: u32,
    pub key: String,
    pub value: String,
    /// Content after the indent, comment-stripped and right-trimmed. The
    /// tabular decoders split this into row fields.
    pub content: String,
    pub header: Option<ArrayHeader>,
}

/// Counts leading spaces; tabs count one unit each but are fatal under
/// strict mode.
pub(crate) fn count_indent(line: &str, strict: bool, line_no: u32) -> Result<usize> {
    let mut indent = 0;
    for ch in line.chars() {
        match ch {
            ' ' => indent += 1,
            '\t' => {
                if strict {
                    return Err(Error::Parse(
                        ParseError::new(
                            "Tab characters not allowed in indentation (strict mode)",
                        )
                        .at_line(line_no)
                        .with_snippet(line),
                    ));
                }
                indent += 1;
            }
            _ => break,
        }
    }
    Ok(indent)
}

/// Returns `true` for a full-line `#` or `//` comment.
pub(crate) fn is_comment_line(content: &str) -> bool {
    let content = content.trim_start();
    content.starts_with('#') || content.starts_with("//")
}

/// Truncates a trailing `#` or `//` comment, honoring double-quoted string
/// state and backslash escapes. The comment marker must be preceded by
/// whitespace to count.
pub(crate) fn strip_trailing_comment(content: &str) -> &str {
    let mut in_string = false;
    let mut escape = false;
    let mut prev_is_space = false;

    let mut chars = content.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if escape {
            escape = false;
            prev_is_space = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '#' if !in_string && prev_is_space => {
                return content[..i].trim_end();
            }
            '/' if !in_string && prev_is_space => {
                if matches!(chars.peek(), Some((_, '/'))) {
                    return content[..i].trim_end();
                }
            }
            _ => {}
        }
        prev_is_space = c.is_whitespace();
    }
    content
}

/// Classifies one raw line.
pub(crate) fn classify(line: &str, line_no: u32, opts: &ParseOptions) -> Result<Line> {
    let indent = count_indent(line, opts.strict, line_no)?;
    let content = &line[indent..];

    let mut out = Line {
        kind: LineKind::Empty,
        indent,
        line_no,
        key: String::new(),
        value: String::new(),
        content: String::new(),
        header: None,
    };

    if content.trim().is_empty() {
        return Ok(out);
    }

    if opts.allow_comments && is_comment_line(content) {
        out.kind = LineKind::Comment;
        return Ok(out);
    }

    let content = if opts.allow_comments {
        strip_trailing_comment(content)
    } else {
        content
    };
    let content = content.trim_end();
    out.content = content.to_string();

    // List item: "- value", or a bare "-" introducing a nested value.
    if let Some(rest) = content.strip_prefix("- ") {
        out.kind = LineKind::ListItem;
        out.value = rest.trim().to_string();
        return Ok(out);
    }
    if content == "-" {
        out.kind = LineKind::ListItem;
        return Ok(out);
    }

    if content.starts_with('[') {
        if let Some(header) = parse_array_header(content) {
            out.kind = if header.tabular {
                LineKind::TabularHeader
            } else {
                LineKind::ArrayHeader
            };
            out.header = Some(header);
            return Ok(out);
        }
    }

    if let Some(colon) = find_unquoted_colon(content) {
        let mut key = content[..colon].trim();
        // Quoted keys are stripped verbatim; no escape processing inside
        // keys.
        if key.len() >= 2 && key.starts_with('"') && key.ends_with('"') {
            key = &key[1..key.len() - 1];
        }
        let rest = content[colon + 1..].trim();
        out.key = key.to_string();
        if rest.is_empty() {
            out.kind = LineKind::KeyNested;
        } else {
            out.kind = LineKind::KeyValue;
            out.value = rest.to_string();
        }
        return Ok(out);
    }

    out.kind = LineKind::RawValue;
    out.value = content.trim().to_string();
    Ok(out)
}

/// Finds the first `:` outside a double-quoted string.
fn find_unquoted_colon(content: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in content.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            ':' if !in_string => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parses `[` digits? `]` (`{` fields `}`)? `:` with nothing but
/// whitespace after the colon. Returns `None` if the text is not a
/// well-formed header.
pub(crate) fn parse_array_header(text: &str) -> Option<ArrayHeader> {
    let text = text.trim();
    let rest = text.strip_prefix('[')?;

    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let declared = if digits_end > 0 {
        rest[..digits_end].parse().ok()?
    } else {
        0
    };
    let rest = rest[digits_end..].strip_prefix(']')?;

    let (fields, tabular, rest) = if let Some(body) = rest.strip_prefix('{') {
        let close = body.find('}')?;
        let fields = body[..close]
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        (fields, true, &body[close + 1..])
    } else {
        (Vec::new(), false, rest)
    };

    let rest = rest.trim_start().strip_prefix(':')?;
    if !rest.trim().is_empty() {
        return None;
    }

    Some(ArrayHeader {
        declared,
        fields,
        tabular,
    })
}

/// `true` / `false`, or nothing.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// A decimal integer token: optional leading `-`, digits only, no `.` or
/// exponent. Range checks are the caller's business.
pub(crate) fn parse_int_token(text: &str) -> Option<i64> {
    if text.is_empty() || text.contains(['.', 'e', 'E']) {
        return None;
    }
    let first = text.as_bytes()[0];
    if first != b'-' && !first.is_ascii_digit() {
        return None;
    }
    text.parse().ok()
}

/// An IEEE-754 double token. Leading `+` is rejected; non-finite results
/// are returned and left for the caller's strictness policy.
pub(crate) fn parse_double(text: &str) -> Option<f64> {
    if text.is_empty() || text.starts_with('+') {
        return None;
    }
    text.parse().ok()
}

/// Decodes a double-quoted string token. Escapes: `\\ \" \n \r \t \uXXXX`
/// (BMP). Under strict mode any other escape is an error (`None`); in
/// lenient mode unknown escapes pass through literally.
pub(crate) fn parse_quoted(text: &str, strict: bool) -> Option<String> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return None;
    }
    let interior = &text[1..text.len() - 1];
    let mut result = String::with_capacity(interior.len());
    let mut chars = interior.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' || chars.peek().is_none() {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('u') => {
                let mut hex = String::with_capacity(4);
                for _ in 0..4 {
                    match chars.next() {
                        Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                        _ => {
                            if strict {
                                return None;
                            }
                            result.push('\\');
                            result.push('u');
                            result.push_str(&hex);
                            hex.clear();
                            break;
                        }
                    }
                }
                if hex.len() == 4 {
                    let cp = u32::from_str_radix(&hex, 16).ok()?;
                    match char::from_u32(cp) {
                        Some(decoded) => result.push(decoded),
                        None => {
                            if strict {
                                return None;
                            }
                            result.push('\\');
                            result.push('u');
                            result.push_str(&hex);
                        }
                    }
                }
            }
            Some(other) => {
                if strict {
                    return None;
                }
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    Some(result)
}

/// Classifies a trimmed token as a primitive value.
///
/// Integer tokens become `Int` only inside the open-closed interval
/// `(i32::MIN, i32::MAX]`; `i32::MIN` itself and wider values fall through
/// to `Double`. Under strict mode, tokens matching no rule (including
/// non-finite doubles and malformed quoted strings) return `None`; lenient
/// mode falls back to an unquoted string.
pub(crate) fn parse_primitive(text: &str, strict: bool) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text == "null" {
        return Some(Value::Null);
    }
    if let Some(b) = parse_bool(text) {
        return Some(Value::Bool(b));
    }

    if text.starts_with('"') {
        if let Some(s) = parse_quoted(text, strict) {
            return Some(Value::String(s));
        }
        if !strict {
            return Some(Value::String(text.to_string()));
        }
        return None;
    }

    if let Some(i) = parse_int_token(text) {
        // i32::MIN collides with the integer NA sentinel of columnar
        // hosts; it parses as Double instead.
        if i > i32::MIN as i64 && i <= i32::MAX as i64 {
            return Some(Value::Int(i));
        }
    }

    if let Some(d) = parse_double(text) {
        if d.is_finite() || !strict {
            return Some(Value::Double(d));
        }
        return None;
    }

    if !strict {
        return Some(Value::String(text.to_string()));
    }
    None
}

/// Splits a tabular row on `delim`, honoring double-quoted strings and
/// backslash escapes. Fields come back trimmed.
pub(crate) fn split_row(line: &str, delim: char) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            c if c == delim && !in_string => {
                fields.push(line[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    fields.push(line[start..].trim());
    fields
}
