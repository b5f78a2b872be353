//! Configuration records for parsing, tabular decoding, streaming, and
//! encoding.
//!
//! All records follow the same pattern: a [`Default`] that matches the
//! documented defaults, plus chained `with_*` builders.
//!
//! ## Examples
//!
//! ```rust
//! use toonlite::{ColType, EncodeOptions, ParseOptions, TabularOptions};
//!
//! let parse = ParseOptions::new().with_strict(false);
//! assert!(parse.allow_comments);
//!
//! let tabular = TabularOptions::new()
//!     .with_key("users")
//!     .with_col_type("id", ColType::Integer);
//!
//! let encode = EncodeOptions::new().with_indent(4).with_canonical(true);
//! assert_eq!(encode.indent, 4);
//! let _ = (tabular, encode);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Host-provided cancellation hook, polled roughly every 10,000 lines by
/// the tabular decoder and the row streamer. Returning `true` aborts the
/// operation with [`Error::Cancelled`](crate::Error::Cancelled).
pub type InterruptHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Options for DOM parsing and validation.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Reject permissive relaxations: tab indentation, unknown escape
    /// sequences, `NaN`/`Inf` literals, bare values that match no rule.
    pub strict: bool,
    /// Collapse tabular blocks into [`Value::Table`](crate::Value::Table)
    /// instead of an array of per-row objects.
    pub simplify: bool,
    /// Recognize `#` and `//` comments (full-line and trailing).
    pub allow_comments: bool,
    /// Permit repeated keys in one object; the last occurrence wins. When
    /// `false` a repeated key is a fatal error.
    pub allow_duplicate_keys: bool,
    /// Record non-fatal anomalies as warnings.
    pub warn: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: true,
            simplify: true,
            allow_comments: true,
            allow_duplicate_keys: true,
            warn: true,
        }
    }
}

impl ParseOptions {
    /// Creates the default options (everything on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    #[must_use]
    pub fn with_comments(mut self, allow: bool) -> Self {
        self.allow_comments = allow;
        self
    }

    #[must_use]
    pub fn with_duplicate_keys(mut self, allow: bool) -> Self {
        self.allow_duplicate_keys = allow;
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }
}

/// Options for the encoder.
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// Emit a cosmetic space after `:` and after `,` in tabular rows.
    /// Newlines and indentation are structural and always emitted.
    pub pretty: bool,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Error on `NaN`/`Inf` doubles instead of writing `null`.
    pub strict: bool,
    /// Sort object keys lexicographically instead of keeping insertion
    /// order.
    pub canonical: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            pretty: true,
            indent: 2,
            strict: true,
            canonical: false,
        }
    }
}

impl EncodeOptions {
    /// Creates the default options (pretty, 2-space indent, strict).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_canonical(mut self, canonical: bool) -> Self {
        self.canonical = canonical;
        self
    }
}

/// The four column types a tabular decode can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColType {
    Logical,
    Integer,
    Double,
    String,
}

impl fmt::Display for ColType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColType::Logical => "logical",
            ColType::Integer => "integer",
            ColType::Double => "double",
            ColType::String => "string",
        };
        write!(f, "{name}")
    }
}

/// Policy for rows whose field count differs from the current schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RaggedRows {
    /// Short rows are padded with NA; long rows append `V<n>` columns,
    /// backfilled with NA, and an aggregated warning is emitted.
    #[default]
    ExpandWarn,
    /// Any field-count mismatch is a fatal error.
    Error,
}

/// Policy for a declared `[N]` that does not match the observed row count.
///
/// A header with no declared count (`declared_count == 0`) carries no
/// constraint; neither policy applies to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CountMismatch {
    /// Warn and use the observed count.
    #[default]
    Warn,
    /// Fail the decode.
    Error,
}

/// Options for tabular decoding ([`read_table`](crate::read_table) and
/// friends).
#[derive(Clone)]
pub struct TabularOptions {
    /// Decode the tabular array found under this top-level key instead of
    /// the first tabular header in the document.
    pub key: Option<String>,
    /// Pinned column types, by field name. Tokens that cannot be coerced
    /// to a pinned type become NA and are reported in a `force_type`
    /// warning.
    pub col_types: HashMap<String, ColType>,
    pub ragged_rows: RaggedRows,
    pub n_mismatch: CountMismatch,
    /// Upper bound on schema expansion; `None` is unbounded.
    pub max_extra_cols: Option<usize>,
    /// Reject tab indentation.
    pub strict: bool,
    /// Recognize `#` and `//` comments between and after rows.
    pub allow_comments: bool,
    /// Record non-fatal anomalies as warnings.
    pub warn: bool,
    /// Cancellation hook, polled every ~10,000 lines.
    pub interrupt: Option<InterruptHook>,
}

impl Default for TabularOptions {
    fn default() -> Self {
        TabularOptions {
            key: None,
            col_types: HashMap::new(),
            ragged_rows: RaggedRows::default(),
            n_mismatch: CountMismatch::default(),
            max_extra_cols: None,
            strict: true,
            allow_comments: true,
            warn: true,
            interrupt: None,
        }
    }
}

impl TabularOptions {
    /// Creates the default options: `ExpandWarn` ragged policy, `Warn`
    /// count policy, unbounded expansion, strict indentation, comments and
    /// warnings on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_col_type(mut self, name: impl Into<String>, ty: ColType) -> Self {
        self.col_types.insert(name.into(), ty);
        self
    }

    #[must_use]
    pub fn with_ragged_rows(mut self, policy: RaggedRows) -> Self {
        self.ragged_rows = policy;
        self
    }

    #[must_use]
    pub fn with_n_mismatch(mut self, policy: CountMismatch) -> Self {
        self.n_mismatch = policy;
        self
    }

    #[must_use]
    pub fn with_max_extra_cols(mut self, max: usize) -> Self {
        self.max_extra_cols = Some(max);
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_comments(mut self, allow: bool) -> Self {
        self.allow_comments = allow;
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }

    #[must_use]
    pub fn with_interrupt(mut self, hook: InterruptHook) -> Self {
        self.interrupt = Some(hook);
        self
    }
}

impl fmt::Debug for TabularOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularOptions")
            .field("key", &self.key)
            .field("col_types", &self.col_types)
            .field("ragged_rows", &self.ragged_rows)
            .field("n_mismatch", &self.n_mismatch)
            .field("max_extra_cols", &self.max_extra_cols)
            .field("strict", &self.strict)
            .field("allow_comments", &self.allow_comments)
            .field("warn", &self.warn)
            .field("interrupt", &self.interrupt.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Options for [`stream_rows`](crate::stream_rows): tabular decoding plus a
/// batch size.
#[derive(Clone, Debug)]
pub struct StreamOptions {
    pub tabular: TabularOptions,
    /// Rows per batch handed to the consumer. The trailing partial batch
    /// is always flushed.
    pub batch_size: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        StreamOptions {
            tabular: TabularOptions::new(),
            batch_size: 1000,
        }
    }
}

impl StreamOptions {
    /// Creates the default options (batch size 1000).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_tabular(mut self, tabular: TabularOptions) -> Self {
        self.tabular = tabular;
        self
    }
}
