//! Encoding values to TOON text.
//!
//! The encoder walks a [`Value`] and emits indented text. Output is
//! deterministic for a given value and options. Newlines and indentation
//! are structural and always present; `pretty` only controls the cosmetic
//! space after `:` and after `,` in tabular rows, and `canonical` sorts
//! object keys.
//!
//! Arrays of same-shaped flat objects collapse into the compact tabular
//! form automatically, so a decoded table re-encodes as a table whether it
//! traveled as [`Value::Table`] or as an array of row objects.
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use toonlite::to_string;
//!
//! #[derive(Serialize)]
//! struct Point { x: i64, y: i64 }
//!
//! let toon = to_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(toon, "x: 1\ny: 2");
//! ```

use serde::{ser, Serialize};

use crate::options::EncodeOptions;
use crate::table::{Column, Table};
use crate::{Error, Map, Result, Value};

/// The TOON encoder. Single-use: [`encode`](Encoder::encode) consumes it
/// and returns the finished text.
pub struct Encoder {
    opts: EncodeOptions,
    out: String,
}

impl Encoder {
    #[must_use]
    pub fn new(opts: EncodeOptions) -> Self {
        Encoder {
            opts,
            out: String::with_capacity(256),
        }
    }

    /// Encodes `value` as TOON text.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Encode`] on `NaN`/`Inf` doubles under strict
    /// mode.
    pub fn encode(mut self, value: &Value) -> Result<String> {
        self.encode_value(value, 0)?;
        Ok(self.out)
    }

    /// Encodes a table as a standalone tabular block.
    pub fn encode_table(mut self, table: &Table) -> Result<String> {
        self.write_table(table, 0)?;
        Ok(self.out)
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth * self.opts.indent {
            self.out.push(' ');
        }
    }

    fn sp(&mut self) {
        if self.opts.pretty {
            self.out.push(' ');
        }
    }

    fn encode_value(&mut self, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Array(items) => self.write_array(items, depth),
            Value::Object(map) => self.write_object(map, depth),
            Value::Table(table) => self.write_table(table, depth),
            scalar => self.write_scalar(scalar),
        }
    }

    /// Inline form of a non-structural value.
    fn write_scalar(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => self.out.push_str(&i.to_string()),
            Value::Double(d) => self.write_double(*d)?,
            Value::String(s) => self.write_quoted(s),
            Value::Date(date) => {
                self.out.push('"');
                self.out.push_str(&date.format("%Y-%m-%d").to_string());
                self.out.push('"');
            }
            Value::Datetime(dt) => {
                self.out.push('"');
                self.out
                    .push_str(&dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());
                self.out.push('"');
            }
            Value::Array(_) | Value::Object(_) | Value::Table(_) => {
                unreachable!("structural values are written in block form")
            }
        }
        Ok(())
    }

    /// Shortest round-trip decimal with a guaranteed `.` or exponent, so a
    /// reparse classifies the token as a double.
    fn write_double(&mut self, d: f64) -> Result<()> {
        if d.is_nan() {
            if self.opts.strict {
                return Err(Error::encode("NaN values not allowed in strict mode"));
            }
            self.out.push_str("null");
            return Ok(());
        }
        if d.is_infinite() {
            if self.opts.strict {
                return Err(Error::encode("Inf/-Inf values not allowed in strict mode"));
            }
            self.out.push_str("null");
            return Ok(());
        }

        let s = d.to_string();
        self.out.push_str(&s);
        if !s.contains('.') && !s.contains('e') && !s.contains('E') {
            self.out.push_str(".0");
        }
        Ok(())
    }

    /// Strings always encode double-quoted and escaped.
    fn write_quoted(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    /// A key is quoted iff it is empty or contains `:`, whitespace, or a
    /// quote.
    fn write_key(&mut self, key: &str) {
        let needs_quotes = key.is_empty()
            || key.contains(':')
            || key.contains('"')
            || key.chars().any(char::is_whitespace);
        if needs_quotes {
            self.write_quoted(key);
        } else {
            self.out.push_str(key);
        }
    }

    fn write_object(&mut self, map: &Map, depth: usize) -> Result<()> {
        let mut entries: Vec<(&String, &Value)> = map.iter().collect();
        if self.opts.canonical {
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        for (i, (key, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.indent(depth);
            self.write_key(key);
            self.out.push(':');

            match value {
                Value::Object(inner) if !inner.is_empty() => {
                    self.out.push('\n');
                    self.write_object(inner, depth + 1)?;
                }
                // An empty object has no line form; the bare key stands.
                Value::Object(_) => {}
                Value::Array(_) | Value::Table(_) => {
                    self.sp();
                    self.encode_value(value, depth)?;
                }
                scalar => {
                    self.sp();
                    self.write_scalar(scalar)?;
                }
            }
        }
        Ok(())
    }

    fn write_array(&mut self, items: &[Value], depth: usize) -> Result<()> {
        if items.is_empty() {
            self.out.push_str("[0]:");
            return Ok(());
        }

        if let Some(keys) = tabular_shape(items) {
            return self.write_object_rows(items, &keys, depth);
        }

        self.out.push('[');
        self.out.push_str(&items.len().to_string());
        self.out.push_str("]:");

        for item in items {
            self.out.push('\n');
            self.indent(depth + 1);
            match item {
                Value::Object(map) if !map.is_empty() => {
                    self.out.push('-');
                    self.out.push('\n');
                    self.write_object(map, depth + 2)?;
                }
                Value::Object(_) => self.out.push('-'),
                Value::Array(_) | Value::Table(_) => {
                    self.out.push('-');
                    self.out.push('\n');
                    self.indent(depth + 2);
                    self.encode_value(item, depth + 2)?;
                }
                scalar => {
                    self.out.push_str("- ");
                    self.write_scalar(scalar)?;
                }
            }
        }
        Ok(())
    }

    /// Compact tabular form for an array of same-shaped flat objects.
    fn write_object_rows(
        &mut self,
        items: &[Value],
        keys: &[&String],
        depth: usize,
    ) -> Result<()> {
        self.out.push('[');
        self.out.push_str(&items.len().to_string());
        self.out.push_str("]{");
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.out.push_str(key);
        }
        self.out.push_str("}:");

        for item in items {
            let map = item.as_object().expect("checked by tabular_shape");
            self.out.push('\n');
            self.indent(depth + 1);
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    self.out.push(',');
                    self.sp();
                }
                let cell = map.get(key).unwrap_or(&Value::Null);
                self.write_scalar(cell)?;
            }
        }
        Ok(())
    }

    fn write_table(&mut self, table: &Table, depth: usize) -> Result<()> {
        self.out.push('[');
        self.out.push_str(&table.n_rows().to_string());
        self.out.push_str("]{");
        for (i, name) in table.names().iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.out.push_str(name);
        }
        self.out.push_str("}:");

        for row in 0..table.n_rows() {
            self.out.push('\n');
            self.indent(depth + 1);
            for col in 0..table.n_cols() {
                if col > 0 {
                    self.out.push(',');
                    self.sp();
                }
                self.write_cell(table.column(col).expect("in range"), row)?;
            }
        }
        Ok(())
    }

    /// One table cell; NA writes `null`.
    fn write_cell(&mut self, column: &Column, row: usize) -> Result<()> {
        match column {
            Column::Double(values) => match values.get(row).copied().flatten() {
                Some(d) => self.write_double(d),
                None => {
                    self.out.push_str("null");
                    Ok(())
                }
            },
            _ => self.write_scalar(&column.get(row)),
        }
    }
}

/// Formats one table row as a comma-separated line fragment, the same way
/// [`Encoder`] writes tabular rows. The stream writer shares this so
/// incremental output matches whole-table output byte for byte.
pub(crate) fn format_row(
    table: &Table,
    row: usize,
    strict: bool,
    pretty: bool,
) -> Result<String> {
    let mut enc = Encoder::new(
        EncodeOptions::default()
            .with_strict(strict)
            .with_pretty(pretty),
    );
    for col in 0..table.n_cols() {
        if col > 0 {
            enc.out.push(',');
            enc.sp();
        }
        enc.write_cell(table.column(col).expect("in range"), row)?;
    }
    Ok(enc.out)
}

/// Returns the shared key list when every item is a non-empty object with
/// the same keys in the same order and only scalar values.
fn tabular_shape(items: &[Value]) -> Option<Vec<&String>> {
    let first = match items.first()? {
        Value::Object(map) if !map.is_empty() => map,
        _ => return None,
    };
    let keys: Vec<&String> = first.keys().collect();

    for item in items {
        let map = item.as_object()?;
        if map.len() != keys.len() {
            return None;
        }
        for (i, (key, value)) in map.iter().enumerate() {
            if key != keys[i] {
                return None;
            }
            if matches!(value, Value::Array(_) | Value::Object(_) | Value::Table(_)) {
                return None;
            }
        }
    }
    Some(keys)
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use toonlite::{to_value, Value};
///
/// #[derive(Serialize)]
/// struct Point { x: i64, y: i64 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_object());
/// ```
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` implementation fails.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Serializer producing [`Value`] trees; the bridge from arbitrary host
/// types into the engine's data model.
pub struct ValueSerializer;

pub struct SerializeVec {
    items: Vec<Value>,
}

pub struct SerializeTupleVariantImpl {
    variant: &'static str,
    items: Vec<Value>,
}

pub struct SerializeMapImpl {
    map: Map,
    pending_key: Option<String>,
}

pub struct SerializeStructVariantImpl {
    variant: &'static str,
    map: Map,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariantImpl;
    type SerializeMap = SerializeMapImpl;
    type SerializeStruct = SerializeMapImpl;
    type SerializeStructVariant = SerializeStructVariantImpl;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Int(v as i64))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        if v <= i64::MAX as u64 {
            Ok(Value::Int(v as i64))
        } else {
            Ok(Value::Double(v as f64))
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Double(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(
            v.iter().map(|&b| Value::Int(b as i64)).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut map = Map::with_capacity(1);
        map.insert(variant.to_string(), value.serialize(ValueSerializer)?);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariantImpl> {
        Ok(SerializeTupleVariantImpl {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMapImpl> {
        Ok(SerializeMapImpl {
            map: Map::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMapImpl> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariantImpl> {
        Ok(SerializeStructVariantImpl {
            variant,
            map: Map::with_capacity(len),
        })
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariantImpl {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant.to_string(), Value::Array(self.items));
        Ok(Value::Object(map))
    }
}

impl ser::SerializeMap for SerializeMapImpl {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            other => Err(Error::encode(format!(
                "map keys must be strings, found {other:?}"
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::encode("map value written before its key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMapImpl {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariantImpl {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant.to_string(), Value::Object(self.map));
        Ok(Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EncodeOptions;

    fn encode(value: &Value) -> String {
        Encoder::new(EncodeOptions::default()).encode(value).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(&Value::Null), "null");
        assert_eq!(encode(&Value::Bool(true)), "true");
        assert_eq!(encode(&Value::Int(-42)), "-42");
        assert_eq!(encode(&Value::Double(3.5)), "3.5");
        assert_eq!(encode(&Value::from("hi")), "\"hi\"");
    }

    #[test]
    fn doubles_always_carry_a_marker() {
        assert_eq!(encode(&Value::Double(1.0)), "1.0");
        assert_eq!(encode(&Value::Double(1e10)), "10000000000.0");
        assert_eq!(encode(&Value::Double(1e300)), "1e300");
    }

    #[test]
    fn strict_rejects_nonfinite_doubles() {
        let err = Encoder::new(EncodeOptions::default())
            .encode(&Value::Double(f64::NAN))
            .unwrap_err();
        assert!(err.to_string().contains("NaN"));

        let lenient = EncodeOptions::default().with_strict(false);
        assert_eq!(
            Encoder::new(lenient).encode(&Value::Double(f64::NAN)).unwrap(),
            "null"
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            encode(&Value::from("a\"b\\c\nd")),
            r#""a\"b\\c\nd""#
        );
        assert_eq!(encode(&Value::from("\u{1}")), "\"\\u0001\"");
    }

    #[test]
    fn object_lines() {
        let mut map = Map::new();
        map.insert("a".to_string(), Value::Int(1));
        map.insert("b".to_string(), Value::from("x"));
        assert_eq!(encode(&Value::Object(map)), "a: 1\nb: \"x\"");
    }

    #[test]
    fn canonical_sorts_keys() {
        let mut map = Map::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::Int(1));
        let opts = EncodeOptions::default().with_canonical(true);
        assert_eq!(
            Encoder::new(opts).encode(&Value::Object(map)).unwrap(),
            "a: 1\nb: 2"
        );
    }

    #[test]
    fn key_quoting() {
        let mut map = Map::new();
        map.insert("a key".to_string(), Value::Int(1));
        map.insert("".to_string(), Value::Int(2));
        assert_eq!(
            encode(&Value::Object(map)),
            "\"a key\": 1\n\"\": 2"
        );
    }

    #[test]
    fn arrays_use_list_form() {
        let value = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(encode(&value), "[2]:\n  - 1\n  - 2");
        assert_eq!(encode(&Value::Array(vec![])), "[0]:");
    }

    #[test]
    fn nested_object_under_key() {
        let mut inner = Map::new();
        inner.insert("x".to_string(), Value::Int(1));
        let mut map = Map::new();
        map.insert("nested".to_string(), Value::Object(inner));
        assert_eq!(encode(&Value::Object(map)), "nested:\n  x: 1");
    }

    #[test]
    fn object_items_in_arrays_nest_under_a_dash() {
        let mut a = Map::new();
        a.insert("x".to_string(), Value::Int(1));
        let value = Value::Array(vec![Value::Object(a), Value::Int(9)]);
        assert_eq!(encode(&value), "[2]:\n  -\n    x: 1\n  - 9");
    }

    #[test]
    fn homogeneous_object_arrays_tabularize() {
        let mut a = Map::new();
        a.insert("id".to_string(), Value::Int(1));
        a.insert("name".to_string(), Value::from("a"));
        let mut b = Map::new();
        b.insert("id".to_string(), Value::Int(2));
        b.insert("name".to_string(), Value::from("b"));
        let value = Value::Array(vec![Value::Object(a), Value::Object(b)]);
        assert_eq!(
            encode(&value),
            "[2]{id,name}:\n  1, \"a\"\n  2, \"b\""
        );
    }

    #[test]
    fn dates_encode_quoted() {
        assert_eq!(encode(&Value::from_days(0)), "\"1970-01-01\"");
        assert_eq!(
            encode(&Value::from_timestamp(86400)),
            "\"1970-01-02T00:00:00Z\""
        );
    }

    #[test]
    fn compact_mode_drops_cosmetic_spaces() {
        let mut map = Map::new();
        map.insert("a".to_string(), Value::Int(1));
        let opts = EncodeOptions::default().with_pretty(false);
        assert_eq!(
            Encoder::new(opts).encode(&Value::Object(map)).unwrap(),
            "a:1"
        );
    }

    #[test]
    fn to_value_maps_rust_types() {
        #[derive(serde::Serialize)]
        struct S {
            n: u8,
            v: Vec<bool>,
            opt: Option<i32>,
        }

        let value = to_value(&S {
            n: 3,
            v: vec![true],
            opt: None,
        })
        .unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("n"), Some(&Value::Int(3)));
        assert_eq!(obj.get("v"), Some(&Value::Array(vec![Value::Bool(true)])));
        assert_eq!(obj.get("opt"), Some(&Value::Null));
    }

    #[test]
    fn huge_u64_falls_back_to_double() {
        let value = to_value(&u64::MAX).unwrap();
        assert!(matches!(value, Value::Double(_)));
    }
}
