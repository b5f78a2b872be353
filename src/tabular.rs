//! Tabular decoding: assembling rows into a [`Table`].
//!
//! [`TableAssembler`] is the shared back half of every tabular consumer:
//! it owns the column builders, applies the ragged-row policy (padding,
//! schema expansion, or error), and aggregates the end-of-block warnings.
//! [`TableReader`] is the whole-block decoder behind
//! [`read_table`](crate::read_table) and
//! [`table_from_str`](crate::table_from_str); the row streamer and the DOM
//! parser's `simplify` path feed the same assembler.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{ParseError, Warning, WarningKind};
use crate::line::{
    self, count_indent, is_comment_line, split_row, strip_trailing_comment, ArrayHeader,
};
use crate::options::{ColType, CountMismatch, RaggedRows, TabularOptions};
use crate::read::LineReader;
use crate::table::{ColumnBuilder, Table};
use crate::{Error, Result};

/// Cancellation hooks are polled once per this many input lines.
pub(crate) const INTERRUPT_INTERVAL: usize = 10_000;

/// Builder capacity floor; small declared counts still get a useful
/// starting allocation.
const MIN_CAPACITY: usize = 1000;

/// Accumulates split rows into typed columns under a ragged-row policy.
pub(crate) struct TableAssembler {
    builders: Vec<ColumnBuilder>,
    forced: HashMap<String, ColType>,
    ragged: RaggedRows,
    max_extra_cols: Option<usize>,
    capacity: usize,
    batch_rows: usize,
    total_rows: usize,
    min_fields: usize,
    max_fields: usize,
    schema_expansions: usize,
    force_failures: IndexMap<String, usize>,
}

impl TableAssembler {
    pub(crate) fn new(
        fields: &[String],
        col_types: &HashMap<String, ColType>,
        ragged: RaggedRows,
        max_extra_cols: Option<usize>,
        capacity_hint: usize,
    ) -> Self {
        let capacity = capacity_hint.max(MIN_CAPACITY);
        let mut builders = Vec::with_capacity(fields.len());
        for name in fields {
            let mut builder = ColumnBuilder::new(name.clone(), capacity);
            if let Some(&ty) = col_types.get(name) {
                builder.force_type(ty);
            }
            builders.push(builder);
        }
        TableAssembler {
            builders,
            forced: col_types.clone(),
            ragged,
            max_extra_cols,
            capacity,
            batch_rows: 0,
            total_rows: 0,
            min_fields: usize::MAX,
            max_fields: 0,
            schema_expansions: 0,
            force_failures: IndexMap::new(),
        }
    }

    /// Rows accumulated since the last batch flush.
    pub(crate) fn batch_rows(&self) -> usize {
        self.batch_rows
    }

    /// Rows accumulated over the assembler's whole lifetime.
    pub(crate) fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Stores one split row, applying the ragged-row policy.
    pub(crate) fn push_row(&mut self, fields: &[&str], line_no: u32) -> Result<()> {
        let n = fields.len();
        self.min_fields = self.min_fields.min(n);
        self.max_fields = self.max_fields.max(n);

        if n != self.builders.len() {
            if self.ragged == RaggedRows::Error {
                return Err(Error::Parse(
                    ParseError::new(format!(
                        "Row has {n} fields but expected {}",
                        self.builders.len()
                    ))
                    .at_line(line_no),
                ));
            }
            if n > self.builders.len() {
                self.expand_schema(n, line_no)?;
            }
        }

        let row = self.batch_rows;
        for (i, builder) in self.builders.iter_mut().enumerate() {
            match fields.get(i) {
                Some(field) => builder.set(row, field),
                None => builder.set_null(row),
            }
        }

        self.batch_rows += 1;
        self.total_rows += 1;
        Ok(())
    }

    /// Appends `V<n>` columns up to `n` total, NA-backfilled over the rows
    /// already in this batch.
    fn expand_schema(&mut self, n: usize, line_no: u32) -> Result<()> {
        let extra = n - self.builders.len();
        if let Some(max) = self.max_extra_cols {
            if self.schema_expansions + extra > max {
                return Err(Error::Parse(
                    ParseError::new(format!(
                        "Schema expansion exceeds max_extra_cols ({max})"
                    ))
                    .at_line(line_no),
                ));
            }
        }

        for i in self.builders.len()..n {
            let name = format!("V{}", i + 1);
            let mut builder = ColumnBuilder::new(name.clone(), self.capacity);
            if let Some(&ty) = self.forced.get(&name) {
                builder.force_type(ty);
            }
            if self.batch_rows > 0 {
                builder.set_null(self.batch_rows - 1);
            }
            self.builders.push(builder);
        }
        self.schema_expansions += extra;
        tracing::debug!(total_cols = n, "expanded tabular schema");
        Ok(())
    }

    /// Finalizes the current batch into a table and resets the builders,
    /// carrying each column's name and inferred type forward.
    pub(crate) fn flush_batch(&mut self) -> Result<Table> {
        let capacity = self.capacity;
        let old = std::mem::take(&mut self.builders);
        let mut columns = Vec::with_capacity(old.len());
        for builder in old {
            let name = builder.name().to_string();
            if builder.coercion_failures() > 0 {
                *self.force_failures.entry(name.clone()).or_insert(0) +=
                    builder.coercion_failures();
            }
            let column = builder.finalize();
            let mut fresh = ColumnBuilder::new(name.clone(), capacity);
            fresh.seed_type(column.col_type());
            if let Some(&ty) = self.forced.get(&name) {
                fresh.force_type(ty);
            }
            self.builders.push(fresh);
            columns.push((name, column));
        }
        self.batch_rows = 0;
        Table::from_columns(columns)
    }

    /// Finalizes everything; the assembler is spent afterwards.
    pub(crate) fn finish(&mut self) -> Result<Table> {
        let old = std::mem::take(&mut self.builders);
        let mut columns = Vec::with_capacity(old.len());
        for builder in old {
            let name = builder.name().to_string();
            if builder.coercion_failures() > 0 {
                *self.force_failures.entry(name.clone()).or_insert(0) +=
                    builder.coercion_failures();
            }
            columns.push((name, builder.finalize()));
        }
        self.batch_rows = 0;
        Table::from_columns(columns)
    }

    /// Emits the aggregated `ragged_rows` and `force_type` warnings, one
    /// per category.
    pub(crate) fn drain_warnings(&mut self, warn: bool, out: &mut Vec<Warning>) {
        if !warn {
            return;
        }
        if self.total_rows > 0 && self.min_fields != self.max_fields {
            let mut msg = format!(
                "Tabular rows had inconsistent field counts (min={}, max={}).",
                self.min_fields, self.max_fields
            );
            if self.schema_expansions > 0 {
                msg.push_str(&format!(
                    " Schema expanded to {} columns;",
                    self.builders.len().max(self.max_fields)
                ));
            }
            msg.push_str(" missing values filled with NA.");
            out.push(Warning::new(WarningKind::RaggedRows, msg));
        }
        if !self.force_failures.is_empty() {
            let detail = self
                .force_failures
                .iter()
                .map(|(name, count)| format!("{name} ({count} values)"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(Warning::new(
                WarningKind::ForceType,
                format!("Values not coercible to forced column types became NA: {detail}"),
            ));
            self.force_failures.clear();
        }
    }
}

/// Outcome of scanning for a tabular header.
#[derive(Debug)]
pub(crate) struct FoundHeader {
    pub header: ArrayHeader,
    pub indent: usize,
    pub line_no: u32,
}

/// Scans forward for a tabular header, optionally under a named top-level
/// key. Consumes the reader up to and including the header line.
pub(crate) fn find_tabular_header(
    reader: &mut LineReader<'_>,
    key: Option<&str>,
    strict: bool,
    allow_comments: bool,
) -> Result<Option<FoundHeader>> {
    if let Some(target) = key {
        let mut found_key = false;
        while let Some((text, line_no)) = reader.next_line()? {
            let indent = count_indent(text, strict, line_no)?;
            let content = text[indent..].trim();
            if content.is_empty() || (allow_comments && is_comment_line(content)) {
                continue;
            }
            if indent != 0 {
                continue;
            }
            let Some(colon) = content.find(':') else {
                continue;
            };
            let mut name = content[..colon].trim();
            if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
                name = &name[1..name.len() - 1];
            }
            if name != target {
                continue;
            }
            found_key = true;
            let value = content[colon + 1..].trim();
            if value.starts_with('[') {
                if let Some(header) = line::parse_array_header(value) {
                    if header.tabular {
                        return Ok(Some(FoundHeader {
                            header,
                            indent,
                            line_no,
                        }));
                    }
                }
            }
            // Key found but no inline header; the block may open on the
            // next line.
            break;
        }
        if !found_key {
            return Err(Error::Parse(ParseError::new(format!(
                "Key not found: {target}"
            ))));
        }
    }

    while let Some((text, line_no)) = reader.next_line()? {
        let indent = count_indent(text, strict, line_no)?;
        let content = text[indent..].trim();
        if content.is_empty() || (allow_comments && is_comment_line(content)) {
            continue;
        }
        if content.starts_with('[') {
            if let Some(header) = line::parse_array_header(content) {
                if header.tabular {
                    return Ok(Some(FoundHeader {
                        header,
                        indent,
                        line_no,
                    }));
                }
            }
        }
    }

    Ok(None)
}

/// Whole-block tabular decoder.
///
/// # Examples
///
/// ```rust
/// use toonlite::{ColType, TableReader, TabularOptions};
///
/// let text = "[2]{id,name}:\n  1, \"a\"\n  2, \"b\"\n";
/// let mut reader = TableReader::new(TabularOptions::new());
/// let table = reader.read_str(text).unwrap();
/// assert_eq!(table.n_rows(), 2);
/// assert_eq!(table.column(0).unwrap().col_type(), ColType::Integer);
/// assert!(reader.warnings().is_empty());
/// ```
pub struct TableReader {
    opts: TabularOptions,
    warnings: Vec<Warning>,
}

impl TableReader {
    #[must_use]
    pub fn new(opts: TabularOptions) -> Self {
        TableReader {
            opts,
            warnings: Vec::new(),
        }
    }

    /// Warnings accumulated by the most recent decode.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drains the accumulated warnings.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Decodes the first (or keyed) tabular block of `text`.
    pub fn read_str(&mut self, text: &str) -> Result<Table> {
        let mut reader = LineReader::from_slice(text.as_bytes());
        self.decode(&mut reader, None)
    }

    /// Decodes the first (or keyed) tabular block of the file at `path`.
    pub fn read_file(&mut self, path: &Path) -> Result<Table> {
        let file = path.display().to_string();
        let mut reader = LineReader::open(path)?;
        self.decode(&mut reader, Some(&file))
    }

    fn decode(&mut self, reader: &mut LineReader<'_>, file: Option<&str>) -> Result<Table> {
        self.warnings.clear();
        self.decode_inner(reader)
            .map_err(|e| e.with_file(file))
    }

    fn decode_inner(&mut self, reader: &mut LineReader<'_>) -> Result<Table> {
        let opts = self.opts.clone();
        let found = find_tabular_header(
            reader,
            opts.key.as_deref(),
            opts.strict,
            opts.allow_comments,
        )?
        .ok_or_else(|| Error::Parse(ParseError::new("No tabular array found")))?;

        if found.header.fields.is_empty() {
            return Err(Error::Parse(
                ParseError::new("Invalid tabular header: no fields declared")
                    .at_line(found.line_no),
            ));
        }

        let mut assembler = TableAssembler::new(
            &found.header.fields,
            &opts.col_types,
            opts.ragged_rows,
            opts.max_extra_cols,
            found.header.declared,
        );

        // Rows sit strictly deeper than the header line; the first row
        // fixes the row indent. A line at or above the header's indent is
        // a sibling and ends the block before being read as a row.
        let mut row_indent: Option<usize> = None;
        let mut lines_seen = 0usize;
        while let Some((text, line_no)) = reader.next_line()? {
            lines_seen += 1;
            if lines_seen % INTERRUPT_INTERVAL == 0 {
                if let Some(hook) = &opts.interrupt {
                    if hook() {
                        return Err(Error::Cancelled);
                    }
                }
            }

            let indent = count_indent(text, opts.strict, line_no)?;
            let content = text[indent..].trim();
            if content.is_empty() || (opts.allow_comments && is_comment_line(content)) {
                continue;
            }
            if indent <= found.indent {
                break;
            }
            match row_indent {
                Some(ri) if indent < ri => break,
                None => row_indent = Some(indent),
                _ => {}
            }
            let content = if opts.allow_comments {
                strip_trailing_comment(content)
            } else {
                content
            };
            let fields = split_row(content, ',');
            assembler.push_row(&fields, line_no)?;
        }

        let observed = assembler.total_rows();
        if found.header.declared > 0 && observed != found.header.declared {
            match opts.n_mismatch {
                CountMismatch::Error => {
                    return Err(Error::Parse(ParseError::new(format!(
                        "Declared [{}] but observed {observed} rows",
                        found.header.declared
                    ))));
                }
                CountMismatch::Warn => {
                    if opts.warn {
                        self.warnings.push(Warning::new(
                            WarningKind::CountMismatch,
                            format!(
                                "Declared [{}] but observed {observed} rows; using observed.",
                                found.header.declared
                            ),
                        ));
                    }
                }
            }
        }

        assembler.drain_warnings(opts.warn, &mut self.warnings);
        let table = assembler.finish()?;
        tracing::debug!(
            rows = table.n_rows(),
            cols = table.n_cols(),
            "decoded tabular block"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TabularOptions;
    use crate::table::Column;

    #[test]
    fn assembler_pads_short_rows_with_na() {
        let fields = vec!["a".to_string(), "b".to_string()];
        let mut asm = TableAssembler::new(
            &fields,
            &HashMap::new(),
            RaggedRows::ExpandWarn,
            None,
            0,
        );
        asm.push_row(&["1", "2"], 1).unwrap();
        asm.push_row(&["3"], 2).unwrap();
        let table = asm.finish().unwrap();
        assert_eq!(
            table.column(1).unwrap(),
            &Column::Integer(vec![Some(2), None])
        );
    }

    #[test]
    fn assembler_expands_with_v_names() {
        let fields = vec!["a".to_string()];
        let mut asm = TableAssembler::new(
            &fields,
            &HashMap::new(),
            RaggedRows::ExpandWarn,
            None,
            0,
        );
        asm.push_row(&["1"], 1).unwrap();
        asm.push_row(&["2", "9", "8"], 2).unwrap();
        let table = asm.finish().unwrap();
        assert_eq!(table.names(), ["a", "V2", "V3"]);
        assert_eq!(
            table.column(1).unwrap(),
            &Column::Integer(vec![None, Some(9)])
        );
    }

    #[test]
    fn assembler_bounds_expansion() {
        let fields = vec!["a".to_string()];
        let mut asm = TableAssembler::new(
            &fields,
            &HashMap::new(),
            RaggedRows::ExpandWarn,
            Some(1),
            0,
        );
        asm.push_row(&["1", "2"], 1).unwrap();
        let err = asm.push_row(&["1", "2", "3"], 2).unwrap_err();
        assert!(err.to_string().contains("max_extra_cols"));
    }

    #[test]
    fn finds_header_under_key() {
        let text = "meta: 1\nusers: [2]{id,name}:\n  1, \"a\"\n";
        let mut reader = LineReader::from_slice(text.as_bytes());
        let found = find_tabular_header(&mut reader, Some("users"), true, true)
            .unwrap()
            .unwrap();
        assert_eq!(found.header.fields, ["id", "name"]);
        assert_eq!(found.header.declared, 2);
    }

    #[test]
    fn missing_key_is_an_error() {
        let text = "a: 1\n";
        let mut reader = LineReader::from_slice(text.as_bytes());
        let err = find_tabular_header(&mut reader, Some("users"), true, true).unwrap_err();
        assert!(err.to_string().contains("Key not found: users"));
    }

    #[test]
    fn block_ends_at_dedent() {
        let text = "users: [2]{id}:\n  1\n  2\nafter: 9\n";
        let mut reader = TableReader::new(TabularOptions::new());
        let table = reader.read_str(text).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert!(reader.warnings().is_empty());
    }
}
