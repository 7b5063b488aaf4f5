//! Unit tests for locate.rs record and section lookup.

use super::*;
use crate::marker;

const SAVE: &str = "\
date=1444.11.11
countries={
\tdatabase={
\t\t100={
\t\t\tcountry_name=\"BRI\"
\t\t\tgold=3
\t\t}
\t\t200={
\t\t\tcountry_name=\"FRA\"
\t\t\tgold=10.5
\t\t\tname=\"a{b}c\"
\t\t}
\t}
}
character_db={
\tdatabase={
\t\t7={
\t\t\tfirst_name=\"Louis\"
\t\t}
\t\t12={
\t\t\tfirst_name=\"Anne\"
\t\t}
\t}
}
";

fn fra() -> impl FnMut(&str) -> bool {
    marker::quoted_field("country_name", "FRA")
}

fn countries() -> Locator {
    Locator::new().within(["countries", "database"])
}

// -------------------------------------------------------------------------
// Marker search
// -------------------------------------------------------------------------

#[test]
fn test_marker_returns_only_matching_record() {
    let found = countries()
        .find_record_by_marker(SAVE.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(
        found.text,
        "\t\t200={\n\t\t\tcountry_name=\"FRA\"\n\t\t\tgold=10.5\n\t\t\tname=\"a{b}c\"\n\t\t}\n"
    );
    assert_eq!(found.lines, 7..12);
    assert!(!found.truncated);
    assert_eq!(found.marker_matches, None);
    assert_eq!(found.record_id(), Some("200"));
}

#[test]
fn test_marker_record_parses() {
    let found = find_record_by_marker(SAVE.as_bytes(), fra()).unwrap().unwrap();
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("gold"), Some(&Value::Float(10.5)));
    assert_eq!(body.get("name"), Some(&Value::from("a{b}c")));
    assert!(body.get("country_name").is_some());
}

#[test]
fn test_marker_not_found() {
    let found = countries()
        .find_record_by_marker(SAVE.as_bytes(), marker::quoted_field("country_name", "CAS"))
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_single_line_record() {
    let text = "countries={\n\tdatabase={\n\t\t100={ country_name=\"BRI\" }\n\t\t200={ country_name=\"FRA\" y=2 }\n\t}\n}\n";
    let found = countries()
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(found.text, "\t\t200={ country_name=\"FRA\" y=2 }\n");
    assert_eq!(found.lines, 3..4);
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("y"), Some(&Value::Integer(2)));
}

#[test]
fn test_truncated_record() {
    let text = "countries={\n\tdatabase={\n\t\t200={\n\t\t\tcountry_name=\"FRA\"\n\t\t\tgold=1\n";
    let found = countries()
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert!(found.truncated);
    assert_eq!(found.lines, 2..5);
    assert!(found.text.ends_with("gold=1\n"));
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("gold"), Some(&Value::Integer(1)));
}

#[test]
fn test_scope_skips_markers_before_it() {
    let text = "played_country={\n\tcountry_name=\"FRA\"\n}\ncountries={\n\tdatabase={\n\t\t200={\n\t\t\tcountry_name=\"FRA\"\n\t\t}\n\t}\n}\n";
    let scoped = countries()
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(scoped.lines, 5..8);
    assert_eq!(scoped.record_id(), Some("200"));

    // Without a scope the first marker wins and no record header is near it.
    let unscoped = find_record_by_marker(text.as_bytes(), fra()).unwrap().unwrap();
    assert_eq!(unscoped.lines, 0..3);
}

#[test]
fn test_scope_end_stops_search() {
    let text = "countries={\n\tdatabase={\n\t}\n}\nother={\n\t1={\n\t\tcountry_name=\"FRA\"\n\t}\n}\n";
    let found = countries().find_record_by_marker(text.as_bytes(), fra()).unwrap();
    assert!(found.is_none());
}

#[test]
fn test_count_matches_flags_ambiguity() {
    let text = "countries={\n\tdatabase={\n\t\t1={\n\t\t\tcountry_name=\"FRA\"\n\t\t}\n\t\t2={\n\t\t\tcountry_name=\"FRA\"\n\t\t}\n\t}\n}\n";

    let first = countries()
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(first.marker_matches, None);
    assert!(!first.is_ambiguous());

    let counted = countries()
        .count_matches(true)
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(counted.lines, 2..5);
    assert_eq!(counted.marker_matches, Some(2));
    assert!(counted.is_ambiguous());
}

#[test]
fn test_count_matches_single() {
    let found = countries()
        .count_matches(true)
        .find_record_by_marker(SAVE.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(found.marker_matches, Some(1));
    assert!(!found.is_ambiguous());
}

fn long_record() -> String {
    let mut text = String::from("\t\t200={\n");
    for _ in 0..12 {
        text.push_str("\t\t\tx=1\n");
    }
    text.push_str("\t\t\tcountry_name=\"FRA\"\n\t\t}\n");
    text
}

#[test]
fn test_header_beyond_lookback_falls_back_to_window() {
    let text = long_record();
    let found = find_record_by_marker(text.as_bytes(), fra()).unwrap().unwrap();
    assert_eq!(found.lines, 4..15);
    assert!(!found.truncated);
    assert_eq!(found.record_id(), None);
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("country_name"), Some(&Value::from("FRA")));
}

#[test]
fn test_longer_lookback_finds_header() {
    let text = long_record();
    let found = Locator::new()
        .lookback(20)
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert_eq!(found.lines, 0..15);
    assert_eq!(found.record_id(), Some("200"));
}

#[test]
fn test_lookback_minimum() {
    assert_eq!(LocateOptions::default().lookback(3).lookback, DEFAULT_LOOKBACK);
    assert_eq!(LocateOptions::default().lookback(25).lookback, 25);
}

// -------------------------------------------------------------------------
// Declarations and ids
// -------------------------------------------------------------------------

#[test]
fn test_section_by_declaration() {
    let found = find_section_by_declaration(SAVE.as_bytes(), "character_db=")
        .unwrap()
        .unwrap();
    assert_eq!(found.lines, 14..24);
    assert!(found.text.starts_with("character_db={\n"));
    assert!(found.text.ends_with("\t}\n}\n"));
    let map = found.parse().unwrap();
    assert_eq!(
        Value::Mapping(map).get_path(&["character_db", "database", "7", "first_name"]),
        Some(&Value::from("Louis"))
    );
}

#[test]
fn test_section_quote_aware() {
    let text = "id={ name=\"a{b}c\" x=1 }\nnext={ y=2 }\n";
    let found = find_section_by_declaration(text.as_bytes(), "id=")
        .unwrap()
        .unwrap();
    assert_eq!(found.text, "id={ name=\"a{b}c\" x=1 }\n");
    let map = found.parse().unwrap();
    assert_eq!(Value::Mapping(map).get_path(&["id", "x"]), Some(&Value::Integer(1)));
}

#[test]
fn test_section_scalar_declaration() {
    let found = find_section_by_declaration(SAVE.as_bytes(), "date=")
        .unwrap()
        .unwrap();
    assert_eq!(found.text, "date=1444.11.11\n");
    assert_eq!(found.lines, 0..1);
}

#[test]
fn test_section_missing() {
    assert!(find_section_by_declaration(SAVE.as_bytes(), "nope=").unwrap().is_none());
}

#[test]
fn test_record_by_id() {
    let found = Locator::new()
        .within(["character_db", "database"])
        .find_record_by_id(SAVE.as_bytes(), 12)
        .unwrap()
        .unwrap();
    assert_eq!(found.lines, 19..22);
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("first_name"), Some(&Value::from("Anne")));
}

#[test]
fn test_record_by_id_is_exact() {
    let found = Locator::new().find_record_by_id(SAVE.as_bytes(), "1").unwrap();
    assert!(found.is_none());
}

#[test]
fn test_record_by_id_skips_nested_reference() {
    let text = "character_db={\n\tdatabase={\n\t\t5={\n\t\t\tlinks={\n\t\t\t\t12={ x=1 }\n\t\t\t}\n\t\t}\n\t\t12={\n\t\t\tfirst_name=\"Anne\"\n\t\t}\n\t}\n}\n";
    let found = Locator::new()
        .within(["character_db", "database"])
        .find_record_by_id(text.as_bytes(), 12)
        .unwrap()
        .unwrap();
    assert_eq!(found.lines, 7..10);
}

// -------------------------------------------------------------------------
// Record streaming
// -------------------------------------------------------------------------

#[test]
fn test_records_in_scope() {
    let ids: Vec<String> = countries()
        .records(SAVE.as_bytes())
        .map(|r| r.unwrap().record_id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["100", "200"]);
}

#[test]
fn test_records_unscoped_single_and_multi_line() {
    let text = "1={ a=1 }\n2={\n\tb=2\n}\n";
    let records: Vec<LocatedBlock> = Locator::new()
        .records(text.as_bytes())
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text, "1={ a=1 }\n");
    assert_eq!(records[1].lines, 1..4);
}

#[test]
fn test_records_truncated_tail() {
    let text = "1={ a=1 }\n2={\n\tb=2\n";
    let records: Vec<LocatedBlock> = Locator::new()
        .records(text.as_bytes())
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].truncated);
    assert!(records[1].truncated);
}

// -------------------------------------------------------------------------
// Malformed input
// -------------------------------------------------------------------------

const UNTERMINATED_QUOTE: &str = "\
countries={
\tdatabase={
\t\t100={
\t\t\tcountry_name=\"BRI\"
\t\t\tmotto=\"unterminated }
\t\t}
\t\t200={
\t\t\tcountry_name=\"FRA\"
\t\t\ty=2
\t\t}
\t}
}
";

#[test]
fn test_unterminated_quote_ends_with_its_line() {
    let bri = countries()
        .find_record_by_marker(
            UNTERMINATED_QUOTE.as_bytes(),
            marker::quoted_field("country_name", "BRI"),
        )
        .unwrap()
        .unwrap();
    assert_eq!(bri.lines, 2..6);
    assert!(!bri.truncated);
}

#[test]
fn test_record_after_unterminated_quote_is_found() {
    let fra = countries()
        .find_record_by_id(UNTERMINATED_QUOTE.as_bytes(), 200)
        .unwrap()
        .unwrap();
    assert_eq!(fra.lines, 6..10);
    let body = fra.parse_body().unwrap().unwrap();
    assert_eq!(body.get("y"), Some(&Value::Integer(2)));

    let ids: Vec<String> = countries()
        .records(UNTERMINATED_QUOTE.as_bytes())
        .map(|r| r.unwrap().record_id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["100", "200"]);
}

#[test]
fn test_truncated_record_parses_what_was_read() {
    let text = "countries={\n\tdatabase={\n\t\t200={\n\t\t\tcountry_name=\"FRA\"\n\t\t\tgold=";
    let found = countries()
        .find_record_by_marker(text.as_bytes(), fra())
        .unwrap()
        .unwrap();
    assert!(found.truncated);
    let body = found.parse_body().unwrap().unwrap();
    assert_eq!(body.get("country_name"), Some(&Value::from("FRA")));
    assert!(body.get("gold").is_none());
}
