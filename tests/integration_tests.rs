use serde::{Deserialize, Serialize};
use toonlite::{
    from_str, from_value, to_string, to_value, toon, EncodeOptions, ParseOptions, Parser, Value,
    WarningKind,
};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    total: f64,
}

fn roundtrip(value: Value) -> Value {
    let text = to_string(&value).unwrap();
    from_str(&text).unwrap()
}

#[test]
fn nested_object_end_to_end() {
    let value = from_str("name: \"Alice\"\nage: 30\naddress:\n  city: \"NYC\"\n  zip: 10001")
        .unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    let address = obj.get("address").unwrap().as_object().unwrap();
    assert_eq!(address.get("city"), Some(&Value::from("NYC")));
    assert_eq!(address.get("zip"), Some(&Value::Int(10001)));
}

#[test]
fn primitive_round_trips() {
    let cases = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Int(0),
        Value::Int(42),
        Value::Int(-123),
        Value::Int(2147483647),
        Value::Double(3.14),
        Value::Double(-2.5),
        Value::Double(1e10),
        Value::from(""),
        Value::from("hello"),
        Value::from("line1\nline2"),
    ];
    for case in cases {
        assert_eq!(roundtrip(case.clone()), case, "case {case:?}");
    }
}

#[test]
fn i32_min_round_trips_as_double() {
    let text = to_string(&Value::Int(-2147483648)).unwrap();
    assert_eq!(from_str(&text).unwrap(), Value::Double(-2147483648.0));
}

#[test]
fn vector_round_trip_preserves_na_positions() {
    let value = to_value(&vec![Some(1), None, Some(3)]).unwrap();
    assert_eq!(roundtrip(value.clone()), value);
}

#[test]
fn struct_round_trip_through_serde() {
    let order = Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string(), "admin".to_string()],
        },
        total: 109.97,
    };

    let text = to_string(&order).unwrap();
    let back: Order = from_value(from_str(&text).unwrap()).unwrap();
    assert_eq!(order, back);
}

#[test]
fn duplicate_keys_last_wins_with_one_warning() {
    let mut parser = Parser::new(ParseOptions::default());
    let value = parser.parse_str("key: 1\nkey: 2\nkey: 3").unwrap();
    assert_eq!(
        value.as_object().unwrap().get("key"),
        Some(&Value::Int(3))
    );
    let warnings = parser.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::DuplicateKey);
}

#[test]
fn key_order_matches_source_order() {
    let value = from_str("zeta: 1\nalpha: 2\nmid: 3").unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn crlf_input_parses_like_lf() {
    assert_eq!(
        from_str("a: 1\r\nb:\r\n  c: 2\r\n").unwrap(),
        from_str("a: 1\nb:\n  c: 2\n").unwrap()
    );
}

#[test]
fn empty_input_is_null() {
    assert_eq!(from_str("").unwrap(), Value::Null);
}

#[test]
fn tab_indentation_is_fatal_under_strict() {
    let err = from_str("a:\n\tb: 1").unwrap_err();
    assert!(err.to_string().contains("Tab"));
}

#[test]
fn comments_are_ignored_when_enabled() {
    let value = from_str("# top\na: 1 # trailing\n// another\nb: \"x # not a comment\"")
        .unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.get("a"), Some(&Value::Int(1)));
    assert_eq!(obj.get("b"), Some(&Value::from("x # not a comment")));
}

#[test]
fn comments_are_literal_when_disabled() {
    let opts = ParseOptions::default()
        .with_comments(false)
        .with_strict(false);
    let value = toonlite::from_str_with_options("a: 1 # trailing", &opts).unwrap();
    assert_eq!(
        value.as_object().unwrap().get("a"),
        Some(&Value::from("1 # trailing"))
    );
}

#[test]
fn strict_encode_rejects_nonfinite() {
    let err = to_string(&f64::NAN).unwrap_err();
    assert!(err.to_string().contains("NaN"));
    let err = to_string(&f64::INFINITY).unwrap_err();
    assert!(err.to_string().contains("Inf"));

    let lenient = EncodeOptions::default().with_strict(false);
    assert_eq!(
        toonlite::to_string_with_options(&f64::NAN, &lenient).unwrap(),
        "null"
    );
}

#[test]
fn formatting_is_idempotent() {
    let inputs = [
        "a: 1\nb: 2",
        "users: [2]{id,name}:\n  1, \"a\"\n  2, \"b\"",
        "- 1\n- \"two\"\n- null",
        "outer:\n  inner:\n    deep: true",
    ];
    for input in inputs {
        let once = toonlite::format_str(input, &EncodeOptions::default()).unwrap();
        let twice = toonlite::format_str(&once, &EncodeOptions::default()).unwrap();
        assert_eq!(once, twice, "input {input:?}");
    }
}

#[test]
fn canonical_formatting_sorts_keys() {
    let opts = EncodeOptions::default().with_canonical(true);
    let text = toonlite::format_str("b: 2\na: 1", &opts).unwrap();
    assert_eq!(text, "a: 1\nb: 2");
}

#[test]
fn validation_is_a_value_not_an_error() {
    let good = toonlite::validate_str("a: 1", &ParseOptions::default());
    assert!(good.valid);

    let bad = toonlite::validate_str("k:\n  @@@", &ParseOptions::default());
    assert!(!bad.valid);
    assert_eq!(bad.line, Some(2));
    assert!(bad.snippet.is_some());
}

#[test]
fn validate_file_surfaces_io_separately() {
    let err = toonlite::validate_file("/no/such/path.toon", &ParseOptions::default())
        .unwrap_err();
    assert!(matches!(err, toonlite::Error::Io(_)));
}

#[test]
fn macro_values_encode() {
    let value = toon!({
        "name": "Ada",
        "scores": [1, 2, 3]
    });
    let text = to_string(&value).unwrap();
    let back = from_str(&text).unwrap();
    assert_eq!(back, value);
}

#[test]
fn arrays_of_objects_round_trip_via_tabular_form() {
    let users = vec![
        User {
            id: 1,
            name: "a".to_string(),
            active: true,
            tags: vec![],
        },
        User {
            id: 2,
            name: "b".to_string(),
            active: false,
            tags: vec![],
        },
    ];
    // tags is an array, so these rows are not flat; list form is used.
    let text = to_string(&users).unwrap();
    let back: Vec<User> = from_value(from_str(&text).unwrap()).unwrap();
    assert_eq!(users, back);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.toon");

    let value = from_str("a: 1\nnested:\n  b: \"two\"").unwrap();
    std::fs::write(&path, to_string(&value).unwrap()).unwrap();
    assert_eq!(toonlite::from_file(&path).unwrap(), value);
}
