//! Unit tests for extract.rs field extraction helpers.

use super::*;
use std::io::Cursor;

const COUNTRY: &str = r#"
        country_name="FRA"
        gold=12.5
        max_manpower=9
        manpower=3
        government={
            type=monarchy
            ruler=42
        }
        last_month_produced={ grain=12.5 wine=3 label="Hi there" }
        tags={ FRA BRI  CAS }
        historical_population={ 1.5 2 -3 abc 4.0.1 }
        implemented_privileges={
            { object=priv_a date=1444.11.11 }
            { object="priv_b" sub_object=nope }
        }
        object=outside
"#;

// -------------------------------------------------------------------------
// Pattern extraction
// -------------------------------------------------------------------------

#[test]
fn test_extract_value_float() {
    let gold: Option<f64> = extract_value(COUNTRY, r"gold=([\d.-]+)");
    assert_eq!(gold, Some(12.5));
}

#[test]
fn test_extract_value_missing_or_unconvertible() {
    assert_eq!(extract_value::<i64>(COUNTRY, r"prestige=(\d+)"), None);
    assert_eq!(extract_value::<i64>(COUNTRY, r#"country_name="(\w+)""#), None);
}

#[test]
fn test_extract_value_invalid_pattern() {
    assert_eq!(extract_value::<i64>("a=1", "("), None);
    assert!(extract_all("a=1", "(").is_empty());
}

#[test]
fn test_extract_scalar_default() {
    assert_eq!(extract_scalar(COUNTRY, r"prestige=(\d+)", 0i64), 0);
    assert_eq!(extract_scalar(COUNTRY, r"ruler=(\d+)", 0i64), 42);
    assert_eq!(extract_scalar("gold=abc", r"gold=(\w+)", 7i64), 7);
}

#[test]
fn test_extract_all_in_order() {
    assert_eq!(extract_all("a=1 a=2 b=3", r"a=(\d)"), vec!["1", "2"]);
}

// -------------------------------------------------------------------------
// Structural extraction
// -------------------------------------------------------------------------

#[test]
fn test_extract_field_skips_longer_key() {
    assert_eq!(extract_field(COUNTRY, "manpower"), Some(Value::Integer(3)));
    assert_eq!(extract_field(COUNTRY, "max_manpower"), Some(Value::Integer(9)));
}

#[test]
fn test_extract_field_block() {
    let government = extract_field(COUNTRY, "government").unwrap();
    assert_eq!(government.get("type"), Some(&Value::from("monarchy")));
    assert_eq!(extract_field(COUNTRY, "missing"), None);
    assert_eq!(extract_field("a=", "a"), None);
}

#[test]
fn test_extract_block_ignores_quoted_braces() {
    let text = r#"name={ title="a{b}c" x=1 } after=2"#;
    assert_eq!(extract_block(text, "name"), r#" title="a{b}c" x=1 "#);
}

#[test]
fn test_extract_block_missing_and_unterminated() {
    assert_eq!(extract_block(COUNTRY, "missing"), "");
    assert_eq!(extract_block("a={ b=1", "a"), " b=1");
}

#[test]
fn test_extract_flat_dict() {
    let dict = extract_flat_dict(COUNTRY, "last_month_produced");
    let keys: Vec<&str> = dict.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["grain", "wine", "label"]);
    assert_eq!(dict["grain"], Value::Float(12.5));
    assert_eq!(dict["wine"], Value::Integer(3));
    assert_eq!(dict["label"], Value::from("Hi there"));
}

#[test]
fn test_extract_flat_dict_last_wins_and_quoted_stays_string() {
    let dict = extract_flat_dict(r#"x={ a=1 a=2 b="5" }"#, "x");
    assert_eq!(dict.len(), 2);
    assert_eq!(dict["a"], Value::Integer(2));
    assert_eq!(dict["b"], Value::from("5"));
    assert!(extract_flat_dict(COUNTRY, "missing").is_empty());
}

#[test]
fn test_extract_list() {
    assert_eq!(extract_list(COUNTRY, "tags"), vec!["FRA", "BRI", "CAS"]);
    assert!(extract_list(COUNTRY, "missing").is_empty());
}

#[test]
fn test_extract_number_list_skips_non_numbers() {
    assert_eq!(
        extract_number_list(COUNTRY, "historical_population"),
        vec![1.5, 2.0, -3.0]
    );
}

#[test]
fn test_extract_nested_object_list() {
    assert_eq!(
        extract_nested_object_list(COUNTRY, "implemented_privileges"),
        vec!["priv_a", "priv_b"]
    );
    assert!(extract_nested_object_list(COUNTRY, "missing").is_empty());
}

#[test]
fn test_extract_nested_field_values() {
    let text = "estates={ { type=nobles power=0.5 } { type=clergy } }";
    assert_eq!(
        extract_nested_field_values(text, "estates", "type"),
        vec!["nobles", "clergy"]
    );
}

#[test]
fn test_count_nested_blocks() {
    let text = r#"armies={ { id=1 sub={ a=1 } } { name="x{" } { } } after={ {} }"#;
    assert_eq!(count_nested_blocks(text, "armies"), 3);
    assert_eq!(count_nested_blocks(COUNTRY, "implemented_privileges"), 2);
    assert_eq!(count_nested_blocks(COUNTRY, "missing"), 0);
}

// -------------------------------------------------------------------------
// Header search
// -------------------------------------------------------------------------

#[test]
fn test_find_in_header() {
    let re = Regex::new(r"date=(\d+\.\d+\.\d+)").unwrap();
    let header = "SAV\nversion=1\ndate=1444.11.11\n";
    let found = find_in_header(Cursor::new(header), &re, HEADER_LINES).unwrap();
    assert_eq!(found.as_deref(), Some("1444.11.11"));
}

#[test]
fn test_find_in_header_line_limit() {
    let re = Regex::new(r"date=(\d+\.\d+\.\d+)").unwrap();
    let header = "SAV\nversion=1\ndate=1444.11.11\n";
    assert_eq!(find_in_header(Cursor::new(header), &re, 2).unwrap(), None);
    assert_eq!(find_in_header(Cursor::new(""), &re, 10).unwrap(), None);
}
