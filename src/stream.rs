//! Streaming: fixed-size row batches in, incremental tabular output out.
//!
//! [`RowStreamer`] shares the tabular decoder's front half (header seek,
//! row split, ragged policy) but hands the consumer a [`Table`] every
//! `batch_size` rows instead of materializing the whole block. Column
//! names and types carry across batch resets, and a schema expansion
//! persists for every later batch; batches already emitted are not
//! revisited.
//!
//! [`StreamWriter`] is the reverse: it opens a tabular block with a
//! placeholder row count, appends rows batch by batch, and rewrites the
//! count on close. The file handle closes exactly once, also when the
//! writer is dropped mid-error.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ParseError, Warning, WarningKind};
use crate::line::{count_indent, is_comment_line, split_row, strip_trailing_comment};
use crate::options::{CountMismatch, StreamOptions};
use crate::read::LineReader;
use crate::ser::format_row;
use crate::table::Table;
use crate::tabular::{find_tabular_header, TableAssembler, INTERRUPT_INTERVAL};
use crate::{Error, Result};

/// Streams a tabular block as fixed-size batches.
///
/// # Examples
///
/// ```rust,no_run
/// use toonlite::{RowStreamer, StreamOptions};
///
/// let opts = StreamOptions::new().with_batch_size(500);
/// let mut streamer = RowStreamer::open("big.toon".as_ref(), opts).unwrap();
/// streamer
///     .stream(|batch| {
///         println!("{} rows", batch.n_rows());
///         Ok(())
///     })
///     .unwrap();
/// ```
pub struct RowStreamer {
    opts: StreamOptions,
    reader: LineReader<'static>,
    warnings: Vec<Warning>,
}

impl RowStreamer {
    /// Opens `path` for streaming. An unopenable path fails here.
    pub fn open(path: &Path, opts: StreamOptions) -> Result<Self> {
        let reader = LineReader::open(path)?;
        Ok(RowStreamer {
            opts,
            reader,
            warnings: Vec::new(),
        })
    }

    /// Warnings accumulated by the stream; emitted once, after the final
    /// batch.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drains the accumulated warnings.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Runs the stream, invoking `consumer` once per batch in row order.
    /// A consumer error aborts the stream and propagates.
    pub fn stream<F>(&mut self, mut consumer: F) -> Result<()>
    where
        F: FnMut(Table) -> Result<()>,
    {
        let opts = self.opts.clone();
        let tab = &opts.tabular;

        let found = find_tabular_header(
            &mut self.reader,
            tab.key.as_deref(),
            tab.strict,
            tab.allow_comments,
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
            &tab.col_types,
            tab.ragged_rows,
            tab.max_extra_cols,
            opts.batch_size,
        );

        // Same block-extent rule as the whole-table decoder: rows sit
        // strictly deeper than the header line, and the first row fixes
        // the row indent.
        let mut row_indent: Option<usize> = None;
        let mut lines_seen = 0usize;
        let mut batches = 0usize;

        while let Some((text, line_no)) = self.reader.next_line()? {
            lines_seen += 1;
            if lines_seen % INTERRUPT_INTERVAL == 0 {
                if let Some(hook) = &tab.interrupt {
                    if hook() {
                        return Err(Error::Cancelled);
                    }
                }
            }

            let indent = count_indent(text, tab.strict, line_no)?;
            let content = text[indent..].trim();
            if content.is_empty() || (tab.allow_comments && is_comment_line(content)) {
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
            let content = if tab.allow_comments {
                strip_trailing_comment(content)
            } else {
                content
            };
            let fields = split_row(content, ',');
            assembler.push_row(&fields, line_no)?;

            if assembler.batch_rows() >= opts.batch_size {
                let batch = assembler.flush_batch()?;
                batches += 1;
                tracing::trace!(batch = batches, rows = batch.n_rows(), "emitting batch");
                consumer(batch)?;
            }
        }

        // The trailing partial batch always flushes.
        if assembler.batch_rows() > 0 {
            let batch = assembler.flush_batch()?;
            batches += 1;
            consumer(batch)?;
        }

        let observed = assembler.total_rows();
        if found.header.declared > 0 && observed != found.header.declared {
            match tab.n_mismatch {
                CountMismatch::Error => {
                    return Err(Error::Parse(ParseError::new(format!(
                        "Declared [{}] but observed {observed} rows",
                        found.header.declared
                    ))));
                }
                CountMismatch::Warn => {
                    if tab.warn {
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

        assembler.drain_warnings(tab.warn, &mut self.warnings);
        tracing::debug!(rows = observed, batches, "stream complete");
        Ok(())
    }
}

/// Writes a tabular block incrementally.
///
/// The header goes out with a `[0]` placeholder count; `finish` (or drop)
/// closes the file and splices the real count over the placeholder.
///
/// # Examples
///
/// ```rust,no_run
/// use toonlite::{Column, StreamWriter, Table};
///
/// let schema = vec!["id".to_string(), "name".to_string()];
/// let mut writer = StreamWriter::create("out.toon".as_ref(), schema, 2).unwrap();
/// let batch = Table::from_columns(vec![
///     ("id".to_string(), Column::Integer(vec![Some(1)])),
///     ("name".to_string(), Column::String(vec![Some("a".to_string())])),
/// ])
/// .unwrap();
/// writer.write_batch(&batch).unwrap();
/// writer.finish().unwrap();
/// ```
pub struct StreamWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    schema: Vec<String>,
    indent: usize,
    header_written: bool,
    rows_written: usize,
    closed: bool,
}

impl StreamWriter {
    /// Creates (truncating) `path` for incremental tabular output.
    /// `indent` is the number of spaces before each row.
    pub fn create(path: &Path, schema: Vec<String>, indent: usize) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            Error::Io(format!(
                "Cannot open file for writing: {}: {e}",
                path.display()
            ))
        })?;
        Ok(StreamWriter {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            schema,
            indent,
            header_written: false,
            rows_written: 0,
            closed: false,
        })
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        let writer = self.writer.as_mut().expect("open until closed");
        let mut header = String::from("[0]{");
        header.push_str(&self.schema.join(","));
        header.push_str("}:\n");
        writer.write_all(header.as_bytes()).map_err(|e| Error::io(&e))?;
        self.header_written = true;
        Ok(())
    }

    /// Appends one row per row of `batch`.
    ///
    /// # Errors
    ///
    /// Fails if the batch's column count differs from the schema, or on
    /// I/O failure.
    pub fn write_batch(&mut self, batch: &Table) -> Result<()> {
        if self.closed {
            return Err(Error::Io("stream writer already closed".to_string()));
        }
        if batch.n_cols() != self.schema.len() {
            return Err(Error::encode(format!(
                "batch has {} columns but the schema declares {}",
                batch.n_cols(),
                self.schema.len()
            )));
        }

        self.write_header()?;
        let indent = " ".repeat(self.indent);
        let writer = self.writer.as_mut().expect("open until closed");
        for row in 0..batch.n_rows() {
            let line = format_row(batch, row, false, true)?;
            writer.write_all(indent.as_bytes()).map_err(|e| Error::io(&e))?;
            writer.write_all(line.as_bytes()).map_err(|e| Error::io(&e))?;
            writer.write_all(b"\n").map_err(|e| Error::io(&e))?;
        }
        self.rows_written += batch.n_rows();
        Ok(())
    }

    /// Flushes, closes, and rewrites the placeholder row count.
    pub fn finish(mut self) -> Result<()> {
        self.close()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.write_header()?;
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| Error::io(&e))?;
        }

        // Splice the real count over the first "[0]" token. Rewriting the
        // whole file absorbs the length change when the count has more
        // than one digit.
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&e))?;
        if let Some(pos) = content.find("[0]") {
            let mut updated = String::with_capacity(content.len() + 8);
            updated.push_str(&content[..pos]);
            updated.push('[');
            updated.push_str(&self.rows_written.to_string());
            updated.push(']');
            updated.push_str(&content[pos + 3..]);
            fs::write(&self.path, updated).map_err(|e| Error::io(&e))?;
        }
        Ok(())
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        // Implicit cleanup must not mask an in-flight error; close and
        // swallow anything that fails here.
        if !self.closed {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn batch(ids: &[i32]) -> Table {
        Table::from_columns(vec![(
            "id".to_string(),
            Column::Integer(ids.iter().map(|&i| Some(i)).collect()),
        )])
        .unwrap()
    }

    #[test]
    fn writer_rewrites_multi_digit_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toon");

        let mut writer =
            StreamWriter::create(&path, vec!["id".to_string()], 2).unwrap();
        writer.write_batch(&batch(&[1, 2, 3, 4, 5, 6])).unwrap();
        writer.write_batch(&batch(&[7, 8, 9, 10, 11, 12])).unwrap();
        writer.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[12]{id}:\n"));
        assert_eq!(content.lines().count(), 13);
        assert_eq!(content.lines().nth(12), Some("  12"));
    }

    #[test]
    fn writer_closes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toon");

        {
            let mut writer =
                StreamWriter::create(&path, vec!["id".to_string()], 2).unwrap();
            writer.write_batch(&batch(&[1, 2])).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[2]{id}:\n"));
    }

    #[test]
    fn empty_writer_still_produces_a_valid_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toon");
        StreamWriter::create(&path, vec!["a".to_string(), "b".to_string()], 2)
            .unwrap()
            .finish()
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[0]{a,b}:\n");
    }

    #[test]
    fn writer_rejects_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.toon");
        let mut writer =
            StreamWriter::create(&path, vec!["a".to_string(), "b".to_string()], 2).unwrap();
        let err = writer.write_batch(&batch(&[1])).unwrap_err();
        assert!(err.to_string().contains("schema"));
    }
}
