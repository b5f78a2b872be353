//! Buffered line reading.
//!
//! [`LineReader`] presents a byte source — an in-memory slice or a file —
//! as a sequence of `(line, line_no)` pairs with CRLF normalized away.
//! Line numbering is 1-based and increments by exactly one per returned
//! line. Returned views stay valid only until the next call that advances
//! the reader; callers copy whatever they need to keep.
//!
//! Files are read in 4 MiB chunks. A line that spans a chunk boundary is
//! assembled in an owned scratch buffer and served from there; everything
//! else is served as a borrow straight into the read buffer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ParseError;
use crate::{Error, Result};

const CHUNK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub(crate) struct LineReader<'a> {
    src: Source<'a>,
    line_no: u32,
}

#[derive(Debug)]
enum Source<'a> {
    Slice { data: &'a [u8], pos: usize },
    File(FileSource),
}

#[derive(Debug)]
struct FileSource {
    file: File,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    scratch: Vec<u8>,
}

enum Piece {
    Buf { start: usize, len: usize },
    Scratch,
    End,
}

impl<'a> LineReader<'a> {
    pub(crate) fn from_slice(data: &'a [u8]) -> Self {
        LineReader {
            src: Source::Slice { data, pos: 0 },
            line_no: 0,
        }
    }

    /// Opens `path` for line reading. An unopenable path fails here, before
    /// the first `next_line`.
    pub(crate) fn open(path: &Path) -> Result<LineReader<'static>> {
        Self::open_with_capacity(path, CHUNK_SIZE)
    }

    pub(crate) fn open_with_capacity(path: &Path, capacity: usize) -> Result<LineReader<'static>> {
        let file = File::open(path).map_err(|e| {
            Error::Io(format!("Cannot open file: {}: {e}", path.display()))
        })?;
        Ok(LineReader {
            src: Source::File(FileSource {
                file,
                buf: vec![0; capacity.max(16)],
                pos: 0,
                end: 0,
                eof: false,
                scratch: Vec::new(),
            }),
            line_no: 0,
        })
    }

    /// Returns the next logical line and its 1-based number, or `None` at
    /// end of input. A trailing `\r` is stripped from the view.
    pub(crate) fn next_line(&mut self) -> Result<Option<(&str, u32)>> {
        let bytes: &[u8] = match &mut self.src {
            Source::Slice { data, pos } => {
                if *pos >= data.len() {
                    return Ok(None);
                }
                let start = *pos;
                let (line_end, next) = match memchr::memchr(b'\n', &data[start..]) {
                    Some(i) => (start + i, start + i + 1),
                    None => (data.len(), data.len()),
                };
                *pos = next;
                &data[start..line_end]
            }
            Source::File(f) => {
                f.scratch.clear();
                let piece = loop {
                    if f.pos >= f.end {
                        if !f.refill().map_err(|e| Error::io(&e))? {
                            break if f.scratch.is_empty() {
                                Piece::End
                            } else {
                                Piece::Scratch
                            };
                        }
                    }
                    match memchr::memchr(b'\n', &f.buf[f.pos..f.end]) {
                        Some(i) => {
                            let start = f.pos;
                            f.pos = start + i + 1;
                            if f.scratch.is_empty() {
                                break Piece::Buf { start, len: i };
                            }
                            f.scratch.extend_from_slice(&f.buf[start..start + i]);
                            break Piece::Scratch;
                        }
                        None => {
                            f.scratch.extend_from_slice(&f.buf[f.pos..f.end]);
                            f.pos = f.end;
                        }
                    }
                };
                match piece {
                    Piece::End => return Ok(None),
                    Piece::Buf { start, len } => &f.buf[start..start + len],
                    Piece::Scratch => &f.scratch[..],
                }
            }
        };

        let bytes = match bytes.split_last() {
            Some((b'\r', rest)) => rest,
            _ => bytes,
        };

        self.line_no += 1;
        let line_no = self.line_no;
        let text = std::str::from_utf8(bytes).map_err(|_| {
            Error::Parse(ParseError::new("Invalid UTF-8 in input").at_line(line_no))
        })?;
        Ok(Some((text, line_no)))
    }
}

impl FileSource {
    /// Reads the next chunk into the (fully consumed) buffer. Returns
    /// `false` once the file is exhausted.
    fn refill(&mut self) -> std::io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        self.pos = 0;
        self.end = self.file.read(&mut self.buf)?;
        if self.end == 0 {
            self.eof = true;
            return Ok(false);
        }
        tracing::trace!(bytes = self.end, "refilled read buffer");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn collect(reader: &mut LineReader<'_>) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        while let Some((line, no)) = reader.next_line().unwrap() {
            out.push((line.to_string(), no));
        }
        out
    }

    #[test]
    fn numbers_lines_from_one() {
        let mut reader = LineReader::from_slice(b"a\nb\nc");
        assert_eq!(
            collect(&mut reader),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("c".to_string(), 3),
            ]
        );
    }

    #[test]
    fn strips_crlf() {
        let mut reader = LineReader::from_slice(b"a\r\nb\r\n");
        assert_eq!(
            collect(&mut reader),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn empty_input_has_no_lines() {
        let mut reader = LineReader::from_slice(b"");
        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn lines_spanning_chunks_are_assembled() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let long = "x".repeat(100);
        writeln!(tmp, "{long}").unwrap();
        writeln!(tmp, "short").unwrap();
        tmp.flush().unwrap();

        let mut reader = LineReader::open_with_capacity(tmp.path(), 16).unwrap();
        let lines = collect(&mut reader);
        assert_eq!(lines, vec![(long, 1), ("short".to_string(), 2)]);
    }

    #[test]
    fn missing_file_fails_before_first_line() {
        let err = LineReader::open(Path::new("/no/such/file.toon")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn invalid_utf8_reports_line() {
        let mut reader = LineReader::from_slice(b"ok\n\xff\xfe\n");
        assert!(reader.next_line().unwrap().is_some());
        let err = reader.next_line().unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
