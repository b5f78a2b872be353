//! DOM parsing.
//!
//! [`Parser`] turns classified lines into a [`Value`] tree with an
//! indentation-driven state machine and a one-line peek buffer: whenever a
//! frame reads a line that belongs to an outer frame (indent at or below
//! the frame's parent indent), it pushes the line back and returns. Depth
//! is bounded by input indentation.
//!
//! The module also hosts the validator — a parse that reports failures as
//! a [`ValidationResult`] value instead of an error — and the serde bridge
//! [`from_value`] for rebuilding typed host values out of a parsed tree.
//!
//! ## Usage
//!
//! ```rust
//! use toonlite::{Parser, ParseOptions, Value};
//!
//! let mut parser = Parser::new(ParseOptions::default());
//! let value = parser.parse_str("x: 1\ny: 2").unwrap();
//! assert_eq!(value.as_object().unwrap().len(), 2);
//! assert!(parser.warnings().is_empty());
//! ```

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;

use crate::error::{ParseError, ValidationResult, Warning, WarningKind};
use crate::line::{classify, parse_array_header, parse_primitive, split_row, ArrayHeader, Line, LineKind};
use crate::options::{ParseOptions, RaggedRows};
use crate::read::LineReader;
use crate::tabular::TableAssembler;
use crate::{Error, Map, Result, Value};

/// The DOM parser.
///
/// Reusable: each `parse_*` call clears the previous run's state. Warnings
/// accumulate per call and are read with [`warnings`](Parser::warnings) or
/// drained with [`take_warnings`](Parser::take_warnings).
pub struct Parser {
    opts: ParseOptions,
    warnings: Vec<Warning>,
    peeked: Option<Line>,
}

impl Parser {
    #[must_use]
    pub fn new(opts: ParseOptions) -> Self {
        Parser {
            opts,
            warnings: Vec::new(),
            peeked: None,
        }
    }

    /// Warnings accumulated by the most recent parse.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drains the accumulated warnings.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Parses a complete document from a string. Empty input is `Null`.
    pub fn parse_str(&mut self, text: &str) -> Result<Value> {
        self.parse_slice(text.as_bytes())
    }

    /// Parses a complete document from bytes.
    pub fn parse_slice(&mut self, bytes: &[u8]) -> Result<Value> {
        let mut reader = LineReader::from_slice(bytes);
        self.parse_document(&mut reader, None)
    }

    /// Parses a complete document from a file.
    pub fn parse_file(&mut self, path: &Path) -> Result<Value> {
        let file = path.display().to_string();
        let mut reader = LineReader::open(path)?;
        self.parse_document(&mut reader, Some(&file))
    }

    /// Validates a string without surfacing parse failures as errors.
    pub fn validate_str(&mut self, text: &str) -> ValidationResult {
        match self.parse_str(text) {
            Ok(_) => ValidationResult::ok(),
            Err(Error::Parse(pe)) => ValidationResult::invalid(&pe),
            Err(other) => ValidationResult::invalid(&ParseError::new(other.to_string())),
        }
    }

    /// Validates a file. Only I/O failures surface as `Err`; malformed
    /// documents come back as a `valid == false` result.
    pub fn validate_file(&mut self, path: &Path) -> Result<ValidationResult> {
        let file = path.display().to_string();
        let mut reader = match LineReader::open(path) {
            Ok(reader) => reader,
            Err(err) => return Err(err),
        };
        match self.parse_document(&mut reader, Some(&file)) {
            Ok(_) => Ok(ValidationResult::ok()),
            Err(Error::Parse(pe)) => Ok(ValidationResult::invalid(&pe)),
            Err(other) => Err(other),
        }
    }

    fn parse_document(
        &mut self,
        reader: &mut LineReader<'_>,
        file: Option<&str>,
    ) -> Result<Value> {
        self.warnings.clear();
        self.peeked = None;
        let value = self
            .parse_value(reader, -1)
            .map_err(|e| e.with_file(file))?;
        Ok(value.unwrap_or(Value::Null))
    }

    /// Pops the peek buffer or advances the reader, skipping blank and
    /// comment lines.
    fn next_meaningful(&mut self, reader: &mut LineReader<'_>) -> Result<Option<Line>> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }
        while let Some((text, line_no)) = reader.next_line()? {
            let line = classify(text, line_no, &self.opts)?;
            if matches!(line.kind, LineKind::Empty | LineKind::Comment) {
                continue;
            }
            return Ok(Some(line));
        }
        Ok(None)
    }

    /// Parses one value whose lines are indented deeper than
    /// `parent_indent`. Returns `None` at a dedent (line pushed back) or at
    /// end of input.
    fn parse_value(
        &mut self,
        reader: &mut LineReader<'_>,
        parent_indent: i64,
    ) -> Result<Option<Value>> {
        let Some(line) = self.next_meaningful(reader)? else {
            return Ok(None);
        };
        if (line.indent as i64) <= parent_indent {
            self.peeked = Some(line);
            return Ok(None);
        }

        match line.kind {
            LineKind::KeyValue | LineKind::KeyNested => {
                self.parse_object(reader, parent_indent, line).map(Some)
            }
            LineKind::ListItem => self.parse_list(reader, parent_indent, line).map(Some),
            LineKind::ArrayHeader => {
                let header = line.header.unwrap_or_default();
                self.parse_plain_array(reader, parent_indent, header).map(Some)
            }
            LineKind::TabularHeader => {
                let header = line.header.unwrap_or_default();
                self.parse_tabular_block(reader, parent_indent, header)
                    .map(Some)
            }
            LineKind::RawValue => match parse_primitive(&line.value, self.opts.strict) {
                Some(value) => Ok(Some(value)),
                None => Err(Error::Parse(
                    ParseError::new(format!("Invalid value: {}", line.value))
                        .at_line(line.line_no)
                        .with_snippet(&line.content),
                )),
            },
            LineKind::Empty | LineKind::Comment => unreachable!("skipped by next_meaningful"),
        }
    }

    /// Parses an object whose first entry is `first`. Entries continue at
    /// the same indent; anything else ends the object.
    fn parse_object(
        &mut self,
        reader: &mut LineReader<'_>,
        parent_indent: i64,
        first: Line,
    ) -> Result<Value> {
        let obj_indent = first.indent;
        let mut map = Map::new();
        let mut dup_counts: IndexMap<String, usize> = IndexMap::new();

        self.object_entry(reader, &mut map, &mut dup_counts, first)?;

        loop {
            let Some(line) = self.next_meaningful(reader)? else {
                break;
            };
            if (line.indent as i64) <= parent_indent
                || line.indent != obj_indent
                || !matches!(line.kind, LineKind::KeyValue | LineKind::KeyNested)
            {
                self.peeked = Some(line);
                break;
            }
            self.object_entry(reader, &mut map, &mut dup_counts, line)?;
        }

        if self.opts.warn && !dup_counts.is_empty() {
            let detail = dup_counts
                .iter()
                .map(|(key, extra)| format!("{key} ({} times)", extra + 1))
                .collect::<Vec<_>>()
                .join(", ");
            self.warnings.push(Warning::new(
                WarningKind::DuplicateKey,
                format!("Duplicate keys found: {detail}"),
            ));
        }

        Ok(Value::Object(map))
    }

    fn object_entry(
        &mut self,
        reader: &mut LineReader<'_>,
        map: &mut Map,
        dup_counts: &mut IndexMap<String, usize>,
        line: Line,
    ) -> Result<()> {
        let key = line.key.clone();
        if map.contains_key(&key) {
            if !self.opts.allow_duplicate_keys {
                return Err(Error::Parse(
                    ParseError::new(format!("Duplicate key: {key}"))
                        .at_line(line.line_no)
                        .with_snippet(&line.content),
                ));
            }
            if self.opts.warn {
                *dup_counts.entry(key.clone()).or_insert(0) += 1;
            }
            // Last one wins; re-inserting at the end reflects last write.
            map.shift_remove(&key);
        }

        let value = match line.kind {
            LineKind::KeyValue => self.key_value(reader, &line)?,
            LineKind::KeyNested => self
                .parse_value(reader, line.indent as i64)?
                .unwrap_or(Value::Null),
            _ => unreachable!("object entries are key lines"),
        };

        map.insert(key, value);
        Ok(())
    }

    /// Resolves an inline key value: an array or tabular header opening a
    /// block, a primitive, or a bare-string fallback.
    fn key_value(&mut self, reader: &mut LineReader<'_>, line: &Line) -> Result<Value> {
        if line.value.starts_with('[') {
            if let Some(header) = parse_array_header(&line.value) {
                return if header.tabular {
                    self.parse_tabular_block(reader, line.indent as i64, header)
                } else {
                    self.parse_plain_array(reader, line.indent as i64, header)
                };
            }
        }
        if let Some(value) = parse_primitive(&line.value, self.opts.strict) {
            return Ok(value);
        }
        Ok(Value::String(line.value.clone()))
    }

    /// Parses a bare list introduced by `first`; items continue at the
    /// same indent.
    fn parse_list(
        &mut self,
        reader: &mut LineReader<'_>,
        parent_indent: i64,
        first: Line,
    ) -> Result<Value> {
        let list_indent = first.indent;
        let mut items = Vec::new();
        self.list_item(reader, &mut items, first)?;

        loop {
            let Some(line) = self.next_meaningful(reader)? else {
                break;
            };
            if (line.indent as i64) <= parent_indent
                || line.kind != LineKind::ListItem
                || line.indent != list_indent
            {
                self.peeked = Some(line);
                break;
            }
            self.list_item(reader, &mut items, line)?;
        }

        Ok(Value::Array(items))
    }

    fn list_item(
        &mut self,
        reader: &mut LineReader<'_>,
        items: &mut Vec<Value>,
        line: Line,
    ) -> Result<()> {
        if line.value.is_empty() {
            // A bare dash opens a nested value on the following lines.
            let nested = self
                .parse_value(reader, line.indent as i64)?
                .unwrap_or(Value::Null);
            items.push(nested);
        } else {
            match parse_primitive(&line.value, self.opts.strict) {
                Some(value) => items.push(value),
                None => items.push(Value::String(line.value)),
            }
        }
        Ok(())
    }

    /// Parses items after a `[N]:` header. The first following line
    /// establishes the item indent; every item must be a list item there.
    fn parse_plain_array(
        &mut self,
        reader: &mut LineReader<'_>,
        parent_indent: i64,
        header: ArrayHeader,
    ) -> Result<Value> {
        let mut items = Vec::new();
        let mut item_indent: Option<usize> = None;

        loop {
            let Some(line) = self.next_meaningful(reader)? else {
                break;
            };
            if (line.indent as i64) <= parent_indent {
                self.peeked = Some(line);
                break;
            }
            match item_indent {
                None => {
                    if line.kind != LineKind::ListItem {
                        self.peeked = Some(line);
                        break;
                    }
                    item_indent = Some(line.indent);
                }
                Some(indent) => {
                    if line.kind != LineKind::ListItem || line.indent != indent {
                        self.peeked = Some(line);
                        break;
                    }
                }
            }
            self.list_item(reader, &mut items, line)?;
        }

        if self.opts.warn && header.declared > 0 && items.len() != header.declared {
            self.warnings.push(Warning::new(
                WarningKind::CountMismatch,
                format!(
                    "Declared [{}] but observed {} items; using observed.",
                    header.declared,
                    items.len()
                ),
            ));
        }

        Ok(Value::Array(items))
    }

    /// Parses the rows of a tabular block. The first row establishes the
    /// row indent; the block ends at end of input, a dedent past the
    /// parent, or any line shallower than the rows. With `simplify` on the
    /// block becomes a [`Value::Table`]; otherwise an array of per-row
    /// objects.
    fn parse_tabular_block(
        &mut self,
        reader: &mut LineReader<'_>,
        parent_indent: i64,
        header: ArrayHeader,
    ) -> Result<Value> {
        let mut row_indent: Option<usize> = None;

        if self.opts.simplify {
            let mut assembler = TableAssembler::new(
                &header.fields,
                &HashMap::new(),
                RaggedRows::ExpandWarn,
                None,
                header.declared,
            );

            loop {
                let Some(line) = self.next_meaningful(reader)? else {
                    break;
                };
                if self.row_boundary(&line, parent_indent, &mut row_indent) {
                    break;
                }
                let fields = split_row(&line.content, ',');
                assembler.push_row(&fields, line.line_no)?;
            }

            let observed = assembler.total_rows();
            self.tabular_count_check(header.declared, observed);
            assembler.drain_warnings(self.opts.warn, &mut self.warnings);
            Ok(Value::Table(assembler.finish()?))
        } else {
            let mut rows = Vec::new();
            loop {
                let Some(line) = self.next_meaningful(reader)? else {
                    break;
                };
                if self.row_boundary(&line, parent_indent, &mut row_indent) {
                    break;
                }
                let fields = split_row(&line.content, ',');
                let mut obj = Map::with_capacity(header.fields.len());
                for (name, field) in header.fields.iter().zip(fields) {
                    let value = parse_primitive(field, self.opts.strict)
                        .unwrap_or_else(|| Value::String(field.to_string()));
                    obj.insert(name.clone(), value);
                }
                rows.push(Value::Object(obj));
            }

            self.tabular_count_check(header.declared, rows.len());
            Ok(Value::Array(rows))
        }
    }

    /// Checks whether `line` ends a tabular block, pushing it back if so.
    /// The first row fixes `row_indent`.
    fn row_boundary(
        &mut self,
        line: &Line,
        parent_indent: i64,
        row_indent: &mut Option<usize>,
    ) -> bool {
        let ends = (line.indent as i64) <= parent_indent
            || row_indent.is_some_and(|ri| line.indent < ri);
        if ends {
            self.peeked = Some(line.clone());
            return true;
        }
        if row_indent.is_none() {
            *row_indent = Some(line.indent);
        }
        false
    }

    fn tabular_count_check(&mut self, declared: usize, observed: usize) {
        if self.opts.warn && declared > 0 && observed != declared {
            self.warnings.push(Warning::new(
                WarningKind::CountMismatch,
                format!("Declared [{declared}] but observed {observed} rows; using observed."),
            ));
        }
    }
}

/// Rebuilds a typed host value from a parsed [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use toonlite::from_value;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i64, y: i64 }
///
/// let value = toonlite::from_str("x: 1\ny: 2").unwrap();
/// let point: Point = from_value(value).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error when the value's shape does not match `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: de::DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Double(d) => visitor.visit_f64(d),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Table(table) => {
                let rows: Vec<Value> = (0..table.n_rows())
                    .map(|row| table.row_object(row))
                    .collect();
                visitor.visit_seq(SeqDeserializer::new(rows))
            }
            Value::Date(date) => visitor.visit_string(date.format("%Y-%m-%d").to_string()),
            Value::Datetime(dt) => {
                visitor.visit_string(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(map) if map.len() == 1 => {
                let (variant, value) = map.into_iter().next().expect("len checked");
                visitor.visit_enum(EnumDeserializer { variant, value })
            }
            other => Err(de::Error::custom(format!(
                "expected enum, found {other:?}"
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: items.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(de::Error::custom("value requested before key")),
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(de::Error::custom(format!(
                "expected unit variant, found {other:?}"
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            other => Err(de::Error::custom(format!(
                "expected tuple variant, found {other:?}"
            ))),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Object(map) => visitor.visit_map(MapDeserializer::new(map)),
            other => Err(de::Error::custom(format!(
                "expected struct variant, found {other:?}"
            ))),
        }
    }
}
