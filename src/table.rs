//! Columnar tables and the incremental column builder.
//!
//! A [`Table`] is an ordered set of named, same-length, typed columns with
//! per-position NA. The tabular decoder and the row streamer assemble
//! tables through [`ColumnBuilder`], which infers each column's type from
//! the tokens it sees and promotes monotonically along
//!
//! ```text
//! Unknown -> Logical -> Integer -> Double -> String
//! ```
//!
//! A column never demotes; promotion rewrites the already-stored prefix
//! into the wider representation, preserving values and NA positions.

use crate::options::ColType;
use crate::{Map, Value};

/// A single typed column. `None` marks NA.
///
/// `Factor` is an encode-side representation (1-based integer codes into a
/// levels table); the decoder never produces it, and it encodes as the
/// level strings.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Logical(Vec<Option<bool>>),
    Integer(Vec<Option<i32>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Factor {
        codes: Vec<Option<u32>>,
        levels: Vec<String>,
    },
}

impl Column {
    /// Number of positions in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Logical(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Double(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Factor { codes, .. } => codes.len(),
        }
    }

    /// Returns `true` if the column has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The column's type. Factors report [`ColType::String`] since that is
    /// what they decode back to.
    #[must_use]
    pub fn col_type(&self) -> ColType {
        match self {
            Column::Logical(_) => ColType::Logical,
            Column::Integer(_) => ColType::Integer,
            Column::Double(_) => ColType::Double,
            Column::String(_) | Column::Factor { .. } => ColType::String,
        }
    }

    /// Returns `true` if the position holds NA (or an out-of-range factor
    /// code).
    #[must_use]
    pub fn is_na(&self, row: usize) -> bool {
        match self {
            Column::Logical(v) => v.get(row).map_or(true, Option::is_none),
            Column::Integer(v) => v.get(row).map_or(true, Option::is_none),
            Column::Double(v) => v.get(row).map_or(true, Option::is_none),
            Column::String(v) => v.get(row).map_or(true, Option::is_none),
            Column::Factor { codes, levels } => codes.get(row).map_or(true, |code| {
                code.map_or(true, |c| c == 0 || c as usize > levels.len())
            }),
        }
    }

    /// The value at `row` as a [`Value`]; NA becomes `Value::Null`.
    #[must_use]
    pub fn get(&self, row: usize) -> Value {
        match self {
            Column::Logical(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Bool),
            Column::Integer(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, |i| Value::Int(i as i64)),
            Column::Double(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Double),
            Column::String(v) => v
                .get(row)
                .and_then(|s| s.clone())
                .map_or(Value::Null, Value::String),
            Column::Factor { codes, levels } => codes
                .get(row)
                .copied()
                .flatten()
                .and_then(|code| levels.get(code.checked_sub(1)? as usize))
                .map_or(Value::Null, |level| Value::String(level.clone())),
        }
    }
}

/// An ordered collection of named, same-length columns.
///
/// # Examples
///
/// ```rust
/// use toonlite::{Column, Table};
///
/// let table = Table::from_columns(vec![
///     ("id".to_string(), Column::Integer(vec![Some(1), Some(2)])),
///     ("name".to_string(), Column::String(vec![
///         Some("Alice".to_string()),
///         None,
///     ])),
/// ])
/// .unwrap();
///
/// assert_eq!(table.n_rows(), 2);
/// assert_eq!(table.names(), ["id", "name"]);
/// assert!(table.column(1).unwrap().is_na(1));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Creates an empty table (no columns, no rows).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, column)` pairs.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Encode`](crate::Error::Encode) if the columns
    /// have differing lengths.
    pub fn from_columns(columns: Vec<(String, Column)>) -> crate::Result<Self> {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    /// Appends a column. The first column fixes the row count.
    ///
    /// # Errors
    ///
    /// Fails if the column's length differs from the table's row count.
    pub fn push_column(&mut self, name: String, column: Column) -> crate::Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(crate::Error::encode(format!(
                "column {:?} has {} rows but the table has {}",
                name,
                column.len(),
                self.n_rows
            )));
        }
        self.n_rows = column.len();
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Column names, in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The column at `index`, in declaration order.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// The column named `name`, if any.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx)
    }

    /// Iterates `(name, column)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.names.iter().zip(self.columns.iter())
    }

    /// One row as an object value, for generic consumers.
    #[must_use]
    pub fn row_object(&self, row: usize) -> Value {
        let mut map = Map::with_capacity(self.columns.len());
        for (name, column) in self.iter() {
            map.insert(name.clone(), column.get(row));
        }
        Value::Object(map)
    }
}

/// Internal buffer of a column under construction. The variant is the
/// column's tentative type; values sit parallel to the builder's NA bitmap
/// (entries under an NA bit are placeholders).
#[derive(Debug)]
enum Buf {
    Unknown,
    Logical(Vec<bool>),
    Integer(Vec<i32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl Buf {
    fn col_type(&self) -> Option<ColType> {
        match self {
            Buf::Unknown => None,
            Buf::Logical(_) => Some(ColType::Logical),
            Buf::Integer(_) => Some(ColType::Integer),
            Buf::Double(_) => Some(ColType::Double),
            Buf::String(_) => Some(ColType::String),
        }
    }
}

/// Per-column accumulator with type inference and NA tracking.
///
/// Created at header-parse time by the tabular decoder and the row
/// streamer, fed one cell at a time, and consumed by
/// [`finalize`](ColumnBuilder::finalize).
#[derive(Debug)]
pub(crate) struct ColumnBuilder {
    name: String,
    buf: Buf,
    na: Vec<bool>,
    forced: Option<ColType>,
    coercion_failures: usize,
}

impl ColumnBuilder {
    pub(crate) fn new(name: impl Into<String>, capacity: usize) -> Self {
        ColumnBuilder {
            name: name.into(),
            buf: Buf::Unknown,
            na: Vec::with_capacity(capacity),
            forced: None,
            coercion_failures: 0,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Number of tokens that could not be coerced to a pinned type and
    /// were written as NA instead.
    pub(crate) fn coercion_failures(&self) -> usize {
        self.coercion_failures
    }

    /// Pins the column type. Later tokens that cannot be coerced become NA
    /// and are counted for the aggregated `force_type` warning.
    pub(crate) fn force_type(&mut self, ty: ColType) {
        self.promote(ty);
        self.forced = Some(ty);
    }

    /// Starts the column at `ty` without pinning it; later tokens may
    /// still promote past it. The row streamer uses this to carry a
    /// column's inferred type across batch resets.
    pub(crate) fn seed_type(&mut self, ty: ColType) {
        self.promote(ty);
    }

    /// Records NA at `row`, gap-filling if `row` is past the current end.
    pub(crate) fn set_null(&mut self, row: usize) {
        self.fill_to(row + 1);
        self.na[row] = true;
    }

    /// Parses `token` and stores it at `row`, promoting the column type as
    /// needed.
    pub(crate) fn set(&mut self, row: usize, token: &str) {
        let token = token.trim();

        if token == "null" {
            self.set_null(row);
            return;
        }

        if let Some(forced) = self.forced {
            self.set_coerced(row, token, forced);
            return;
        }

        if let Some(b) = crate::line::parse_bool(token) {
            match self.buf.col_type() {
                None | Some(ColType::Logical) => {
                    self.promote(ColType::Logical);
                    self.write_logical(row, b);
                }
                Some(ColType::Integer) => self.write_integer(row, b as i32),
                Some(ColType::Double) => self.write_double(row, b as i32 as f64),
                Some(ColType::String) => self.write_string(row, token.to_string()),
            }
            return;
        }

        if let Some(unquoted) = crate::line::parse_quoted(token, false) {
            self.promote(ColType::String);
            self.write_string(row, unquoted);
            return;
        }

        if let Some(i) = crate::line::parse_int_token(token) {
            // The column layer has explicit NA, so the full i32 range is
            // representable here (unlike the DOM's open lower bound).
            if let Ok(i) = i32::try_from(i) {
                match self.buf.col_type() {
                    None | Some(ColType::Logical) | Some(ColType::Integer) => {
                        self.promote(ColType::Integer);
                        self.write_integer(row, i);
                    }
                    Some(ColType::Double) => self.write_double(row, i as f64),
                    Some(ColType::String) => self.write_string(row, token.to_string()),
                }
                return;
            }
        }

        if let Some(d) = crate::line::parse_double(token) {
            match self.buf.col_type() {
                Some(ColType::String) => self.write_string(row, token.to_string()),
                _ => {
                    self.promote(ColType::Double);
                    self.write_double(row, d);
                }
            }
            return;
        }

        self.promote(ColType::String);
        self.write_string(row, token.to_string());
    }

    /// Materializes the finished column. A column that never saw a typed
    /// value finalizes as all-NA `Logical`.
    pub(crate) fn finalize(self) -> Column {
        let na = self.na;
        match self.buf {
            Buf::Unknown => Column::Logical(vec![None; na.len()]),
            Buf::Logical(values) => Column::Logical(
                values
                    .into_iter()
                    .zip(&na)
                    .map(|(v, &is_na)| if is_na { None } else { Some(v) })
                    .collect(),
            ),
            Buf::Integer(values) => Column::Integer(
                values
                    .into_iter()
                    .zip(&na)
                    .map(|(v, &is_na)| if is_na { None } else { Some(v) })
                    .collect(),
            ),
            Buf::Double(values) => Column::Double(
                values
                    .into_iter()
                    .zip(&na)
                    .map(|(v, &is_na)| if is_na { None } else { Some(v) })
                    .collect(),
            ),
            Buf::String(values) => Column::String(
                values
                    .into_iter()
                    .zip(&na)
                    .map(|(v, &is_na)| if is_na { None } else { Some(v) })
                    .collect(),
            ),
        }
    }

    fn set_coerced(&mut self, row: usize, token: &str, ty: ColType) {
        match ty {
            ColType::Logical => match crate::line::parse_bool(token) {
                Some(b) => self.write_logical(row, b),
                None => self.coercion_failed(row),
            },
            ColType::Integer => {
                if let Some(b) = crate::line::parse_bool(token) {
                    self.write_integer(row, b as i32);
                } else if let Some(i) =
                    crate::line::parse_int_token(token).and_then(|i| i32::try_from(i).ok())
                {
                    self.write_integer(row, i);
                } else {
                    self.coercion_failed(row);
                }
            }
            ColType::Double => {
                if let Some(b) = crate::line::parse_bool(token) {
                    self.write_double(row, b as i32 as f64);
                } else if let Some(d) = crate::line::parse_double(token) {
                    self.write_double(row, d);
                } else {
                    self.coercion_failed(row);
                }
            }
            ColType::String => {
                let text = crate::line::parse_quoted(token, false)
                    .unwrap_or_else(|| token.to_string());
                self.write_string(row, text);
            }
        }
    }

    fn coercion_failed(&mut self, row: usize) {
        self.coercion_failures += 1;
        self.set_null(row);
    }

    /// Extends the NA bitmap and value buffer to `len`, filling with NA.
    fn fill_to(&mut self, len: usize) {
        while self.na.len() < len {
            self.na.push(true);
            match &mut self.buf {
                Buf::Unknown => {}
                Buf::Logical(v) => v.push(false),
                Buf::Integer(v) => v.push(0),
                Buf::Double(v) => v.push(0.0),
                Buf::String(v) => v.push(String::new()),
            }
        }
    }

    fn write_logical(&mut self, row: usize, value: bool) {
        self.fill_to(row + 1);
        if let Buf::Logical(v) = &mut self.buf {
            v[row] = value;
            self.na[row] = false;
        }
    }

    fn write_integer(&mut self, row: usize, value: i32) {
        self.fill_to(row + 1);
        if let Buf::Integer(v) = &mut self.buf {
            v[row] = value;
            self.na[row] = false;
        }
    }

    fn write_double(&mut self, row: usize, value: f64) {
        self.fill_to(row + 1);
        if let Buf::Double(v) = &mut self.buf {
            v[row] = value;
            self.na[row] = false;
        }
    }

    fn write_string(&mut self, row: usize, value: String) {
        self.fill_to(row + 1);
        if let Buf::String(v) = &mut self.buf {
            v[row] = value;
            self.na[row] = false;
        }
    }

    /// Moves the buffer to `target` if that is a strictly wider type,
    /// rewriting the stored prefix. NA positions survive unchanged.
    fn promote(&mut self, target: ColType) {
        let current = self.buf.col_type();
        let needs = match (current, target) {
            (None, _) => true,
            (Some(ColType::Logical), ColType::Integer | ColType::Double | ColType::String) => true,
            (Some(ColType::Integer), ColType::Double | ColType::String) => true,
            (Some(ColType::Double), ColType::String) => true,
            _ => false,
        };
        if !needs {
            return;
        }

        let len = self.na.len();
        let old = std::mem::replace(&mut self.buf, Buf::Unknown);
        self.buf = match target {
            ColType::Logical => Buf::Logical(vec![false; len]),
            ColType::Integer => Buf::Integer(match old {
                Buf::Logical(v) => v.into_iter().map(|b| b as i32).collect(),
                _ => vec![0; len],
            }),
            ColType::Double => Buf::Double(match old {
                Buf::Logical(v) => v.into_iter().map(|b| b as i32 as f64).collect(),
                Buf::Integer(v) => v.into_iter().map(|i| i as f64).collect(),
                _ => vec![0.0; len],
            }),
            ColType::String => Buf::String(match old {
                Buf::Logical(v) => v
                    .into_iter()
                    .map(|b| if b { "true".to_string() } else { "false".to_string() })
                    .collect(),
                Buf::Integer(v) => v.into_iter().map(|i| i.to_string()).collect(),
                Buf::Double(v) => v.into_iter().map(|d| d.to_string()).collect(),
                _ => vec![String::new(); len],
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalize(builder: ColumnBuilder) -> Column {
        builder.finalize()
    }

    #[test]
    fn infers_logical_then_promotes_to_integer() {
        let mut b = ColumnBuilder::new("x", 4);
        b.set(0, "true");
        b.set(1, "false");
        b.set(2, "7");
        assert_eq!(
            finalize(b),
            Column::Integer(vec![Some(1), Some(0), Some(7)])
        );
    }

    #[test]
    fn integer_promotes_to_double_preserving_values() {
        let mut b = ColumnBuilder::new("x", 4);
        b.set(0, "1");
        b.set(1, "null");
        b.set(2, "2.5");
        assert_eq!(
            finalize(b),
            Column::Double(vec![Some(1.0), None, Some(2.5)])
        );
    }

    #[test]
    fn non_numeric_token_promotes_to_string() {
        let mut b = ColumnBuilder::new("x", 4);
        b.set(0, "1");
        b.set(1, "2.5");
        b.set(2, "apple");
        assert_eq!(
            finalize(b),
            Column::String(vec![
                Some("1".to_string()),
                Some("2.5".to_string()),
                Some("apple".to_string()),
            ])
        );
    }

    #[test]
    fn quoted_cells_unescape_and_force_string() {
        let mut b = ColumnBuilder::new("x", 2);
        b.set(0, r#""a\nb""#);
        b.set(1, "3");
        assert_eq!(
            finalize(b),
            Column::String(vec![Some("a\nb".to_string()), Some("3".to_string())])
        );
    }

    #[test]
    fn gap_fill_writes_na() {
        let mut b = ColumnBuilder::new("x", 4);
        b.set(2, "9");
        assert_eq!(finalize(b), Column::Integer(vec![None, None, Some(9)]));
    }

    #[test]
    fn all_null_column_finalizes_logical() {
        let mut b = ColumnBuilder::new("x", 2);
        b.set_null(0);
        b.set_null(1);
        assert_eq!(finalize(b), Column::Logical(vec![None, None]));
    }

    #[test]
    fn forced_type_pins_and_counts_failures() {
        let mut b = ColumnBuilder::new("x", 4);
        b.force_type(ColType::Integer);
        b.set(0, "5");
        b.set(1, "apple");
        b.set(2, "null");
        assert_eq!(b.coercion_failures(), 1);
        assert_eq!(finalize(b), Column::Integer(vec![Some(5), None, None]));
    }

    #[test]
    fn i32_min_is_representable_in_columns() {
        let mut b = ColumnBuilder::new("x", 1);
        b.set(0, "-2147483648");
        assert_eq!(finalize(b), Column::Integer(vec![Some(i32::MIN)]));
    }

    #[test]
    fn factor_column_reads_levels() {
        let col = Column::Factor {
            codes: vec![Some(2), Some(1), None, Some(9)],
            levels: vec!["lo".to_string(), "hi".to_string()],
        };
        assert_eq!(col.get(0), Value::String("hi".to_string()));
        assert_eq!(col.get(1), Value::String("lo".to_string()));
        assert_eq!(col.get(2), Value::Null);
        assert_eq!(col.get(3), Value::Null);
        assert!(col.is_na(3));
    }
}
