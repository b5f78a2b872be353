/// Builds a [`Value`](crate::Value) from an inline literal.
///
/// Objects take string-literal keys, arrays take any mix of values, and
/// `null` stands for [`Value::Null`](crate::Value::Null). Any other token
/// is an expression and goes through [`to_value`](crate::to_value), so
/// numbers, booleans, strings, and serializable host values all work.
///
/// ```rust
/// use toonlite::{toon, Value};
///
/// let doc = toon!({
///     "name": "Ada",
///     "tags": [1, true, null],
/// });
/// assert_eq!(
///     doc.as_object().unwrap().get("name"),
///     Some(&Value::from("Ada"))
/// );
/// ```
#[macro_export]
macro_rules! toon {
    (null) => {
        $crate::Value::Null
    };

    // Zero repetitions cover {} and [], so the empty collections need no
    // arms of their own.
    ({ $($key:literal : $entry:tt),* $(,)? }) => {
        $crate::Value::Object($crate::Map::from_iter([
            $((String::from($key), $crate::toon!($entry))),*
        ]))
    };

    ([ $($item:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::toon!($item)),*])
    };

    ($scalar:expr) => {
        $crate::to_value(&$scalar).unwrap_or_default()
    };
}

#[cfg(test)]
mod tests {
    use crate::{Map, Value};

    #[test]
    fn null_and_scalars() {
        assert_eq!(toon!(null), Value::Null);
        assert_eq!(toon!(true), Value::Bool(true));
        assert_eq!(toon!(-7), Value::Int(-7));
        assert_eq!(toon!(3.5), Value::Double(3.5));
        assert_eq!(toon!("hello"), Value::from("hello"));
    }

    #[test]
    fn host_expressions_go_through_serde() {
        let tags = vec!["a", "b"];
        assert_eq!(
            toon!(tags),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn collections_and_empties() {
        assert_eq!(toon!([]), Value::Array(vec![]));
        assert_eq!(toon!({}), Value::Object(Map::new()));
        assert_eq!(
            toon!([1, null, "x"]),
            Value::Array(vec![Value::Int(1), Value::Null, Value::from("x")])
        );
    }

    #[test]
    fn objects_nest_and_keep_key_order() {
        let doc = toon!({
            "meta": { "ok": true },
            "rows": [{ "id": 1 }, { "id": 2 }],
        });

        let map = doc.as_object().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["meta", "rows"]);
        assert_eq!(
            map.get("meta").unwrap().as_object().unwrap().get("ok"),
            Some(&Value::Bool(true))
        );
        assert_eq!(map.get("rows").unwrap().as_array().unwrap().len(), 2);
    }
}
