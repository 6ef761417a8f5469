use tabula_core::foreign_keys::derive;
use tabula_core::schema::{CONVERSION, VOLATILE};
use tabula_core::{ForeignKey, ResolvedBusses};
use tabula_types::{DiagnosticKind, Diagnostics, Row, Value};

fn busses(pairs: &[(&str, &str)]) -> ResolvedBusses {
    pairs
        .iter()
        .map(|(role, bus)| ((*role).to_string(), (*bus).to_string()))
        .collect()
}

fn profile_row(profile: Value) -> Row {
    let mut r = Row::new();
    r.insert("name".into(), Value::from("BB_wind_onshore"));
    r.insert("bus".into(), Value::from("electricity"));
    r.insert("profile".into(), profile);
    r
}

#[test]
fn profile_referencing_sequence_column_gets_sequence_key() {
    let rows = vec![profile_row(Value::from("onshore_BB"))];
    let cols = vec!["onshore_BB".to_string()];
    let mut d = Diagnostics::new();
    let keys = derive(&VOLATILE, &busses(&[("bus", "electricity")]), &rows, &cols, "wind", &mut d);

    let json = serde_json::to_value(&keys).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"fields": "bus", "reference": {"resource": "bus", "fields": "name"}},
            {"fields": "profile", "reference": {"resource": "wind_sequence"}},
        ])
    );
    assert!(d.is_empty());
}

#[test]
fn partial_match_still_emits_key_with_warning() {
    let rows = vec![
        profile_row(Value::from("onshore_BB")),
        profile_row(Value::from("onshore_XX")),
    ];
    let cols = vec!["onshore_BB".to_string()];
    let mut d = Diagnostics::for_process("wind");
    let keys = derive(&VOLATILE, &busses(&[("bus", "electricity")]), &rows, &cols, "wind", &mut d);
    assert!(keys.contains(&ForeignKey::sequence("profile", "wind")));
    assert_eq!(d.of_kind(DiagnosticKind::PartialSequenceMatch).count(), 1);
}

#[test]
fn numeric_or_unmatched_profiles_have_no_sequence_key() {
    let cols = vec!["onshore_BB".to_string()];
    let mut d = Diagnostics::new();
    for profile in [Value::Float(1.0), Value::from("missing_col")] {
        let keys = derive(
            &VOLATILE,
            &busses(&[("bus", "electricity")]),
            &[profile_row(profile)],
            &cols,
            "wind",
            &mut d,
        );
        assert_eq!(keys, vec![ForeignKey::bus("bus")]);
    }
    assert!(d.is_empty());
}

#[test]
fn every_bus_role_references_the_bus_table() {
    let mut d = Diagnostics::new();
    let keys = derive(
        &CONVERSION,
        &busses(&[("from_bus", "ch4"), ("to_bus", "electricity")]),
        &[],
        &[],
        "gt",
        &mut d,
    );
    assert_eq!(keys, vec![ForeignKey::bus("from_bus"), ForeignKey::bus("to_bus")]);
}
