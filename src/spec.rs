//! TOON format reference, as implemented by this crate.
//!
//! TOON (Token-Oriented Object Notation) is a line-oriented,
//! indentation-sensitive serialization format. It combines nested
//! records, heterogeneous arrays, and a compact tabular form for large
//! rectangular datasets.
//!
//! # Lines and indentation
//!
//! A document is a sequence of lines terminated by `\n` or `\r\n`.
//! Indentation is counted in leading spaces; nesting is expressed by
//! indenting deeper than the parent line. In strict mode a tab anywhere
//! in the indentation is a fatal error; in lenient mode each tab counts
//! as one unit.
//!
//! Blank lines are ignored. With comments enabled, a line starting with
//! `#` or `//` is ignored, and a ` #` or ` //` outside a double-quoted
//! string truncates the rest of the line.
//!
//! # Objects
//!
//! ```text
//! name: "Alice"
//! age: 30
//! address:
//!   city: "NYC"
//!   zip: 10001
//! ```
//!
//! A `key: value` line is an inline entry; a `key:` line with nothing
//! after the colon opens a nested block on the following, deeper-indented
//! lines. Keys may be double-quoted (`"a key": 1`); the quotes are
//! stripped and the interior kept verbatim. Sibling entries sit at the
//! same indent. By default a repeated key is tolerated, the last
//! occurrence wins, and a `duplicate_key` warning is recorded.
//!
//! # Primitives
//!
//! | Token | Value |
//! |-------|-------|
//! | `null` | null (distinct from missing) |
//! | `true` / `false` | boolean |
//! | decimal digits, optional `-` | integer, when strictly inside `(-2147483648, 2147483647]` |
//! | anything else numeric | IEEE-754 double; a leading `+` is rejected |
//! | `"..."` | string with escapes `\\ \" \n \r \t \uXXXX` |
//!
//! `-2147483648` itself parses as a double: it collides with the integer
//! NA sentinel of columnar hosts. In strict mode `NaN`/`Inf` doubles,
//! unknown escape sequences, and bare tokens that match no rule are
//! errors; lenient mode falls back to unquoted strings.
//!
//! # Arrays
//!
//! ```text
//! [3]:
//!   - 1
//!   - 2
//!   - 3
//! ```
//!
//! The `[N]:` header declares an item count; `N` may be omitted (`[]:`).
//! Items are `- value` lines at one consistent indent. An item whose dash
//! has no inline value opens a nested block:
//!
//! ```text
//! [2]:
//!   -
//!     x: 1
//!   -
//!     x: 2
//! ```
//!
//! When the declared count differs from the observed count, the observed
//! count wins and an `n_mismatch` warning is recorded.
//!
//! # Tabular arrays
//!
//! ```text
//! [3]{name,age,active}:
//!   "Alice", 30, true
//!   "Bob", 25, false
//!   "Charlie", 35, true
//! ```
//!
//! The `[N]{field,...}:` header declares the row count and column names.
//! Rows are comma-separated; a double-quoted field may contain commas and
//! escaped quotes. Column types are inferred per column and promoted
//! monotonically (`Logical → Integer → Double → String`); `null` is NA.
//! Rows shorter than the schema are NA-padded; longer rows append `V<n>`
//! columns under the default `expand_warn` policy, or fail under `error`.
//!
//! A tabular header may also appear inline as a key's value
//! (`users: [2]{id,name}:`), with the rows on the following lines.
//!
//! # Dates
//!
//! There are no date tokens in the grammar; dates and datetimes encode as
//! quoted strings, `"YYYY-MM-DD"` and `"YYYY-MM-DDTHH:MM:SSZ"`.
