use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use tabula_core::{SequenceTable, reshape, to_tall};
use tabula_types::{Row, Value};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn tall(region: &str, start: &str, stop: &str, res: &str, column: &str, values: &[f64]) -> Row {
    let mut r = Row::new();
    r.insert("region".into(), Value::from(region));
    r.insert("timeindex_start".into(), Value::from(start));
    r.insert("timeindex_stop".into(), Value::from(stop));
    r.insert("timeindex_resolution".into(), Value::from(res));
    r.insert(column.into(), Value::floats(values));
    r
}

#[test]
fn regions_pivot_into_suffixed_columns() {
    let rows = vec![
        tall("BB", "2016-01-01 00:00:00", "2016-01-01 02:00:00", "PT1H", "onshore", &[0.1, 0.2, 0.3]),
        tall("BE", "2016-01-01 00:00:00", "2016-01-01 02:00:00", "PT1H", "onshore", &[0.4, 0.5, 0.6]),
    ];
    let wide = reshape(&rows).unwrap();
    assert_eq!(wide.column_names(), vec!["onshore_BB", "onshore_BE"]);
    assert_eq!(wide.len(), 3);
    assert_eq!(wide.index()[2], t0() + TimeDelta::hours(2));
    assert_eq!(wide.column("onshore_BE").unwrap(), &[Some(0.4), Some(0.5), Some(0.6)]);
}

#[test]
fn groups_outer_join_on_timestamp() {
    let rows = vec![
        tall("BB", "2016-01-01T00:00:00", "2016-01-01T01:00:00", "1h", "onshore", &[1.0, 2.0]),
        tall("BB", "2030-01-01T00:00:00", "2030-01-01T01:00:00", "1h", "onshore", &[3.0, 4.0]),
        tall("BB", "2016-01-01T00:00:00", "2016-01-01T01:00:00", "1h", "offshore", &[5.0, 6.0]),
    ];
    let wide = reshape(&rows).unwrap();
    assert_eq!(wide.len(), 4);
    assert_eq!(
        wide.column("onshore_BB").unwrap(),
        &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
    );
    assert_eq!(wide.column("offshore_BB").unwrap(), &[Some(5.0), Some(6.0), None, None]);
}

#[test]
fn first_appearance_wins_for_duplicate_cells() {
    let rows = vec![
        tall("BB", "2016-01-01", "2016-01-01T01:00:00", "h", "x", &[1.0, 2.0]),
        tall("BB", "2016-01-01T01:00:00", "2016-01-01T02:00:00", "h", "x", &[9.0, 3.0]),
    ];
    let wide = reshape(&rows).unwrap();
    assert_eq!(wide.column("x_BB").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn non_numeric_arrays_are_data_errors() {
    let mut r = tall("BB", "2016-01-01", "2016-01-01", "h", "x", &[1.0]);
    r.insert("x".into(), Value::List(vec![Value::from("a")]));
    assert!(matches!(reshape(&[r]), Err(tabula_types::AdapterError::Data(_))));
}

fn arb_wide() -> impl Strategy<Value = SequenceTable> {
    (1usize..24, 1usize..4, 1usize..4, prop_oneof![Just(900i64), Just(3600), Just(86_400)])
        .prop_flat_map(|(len, regions, columns, step)| {
            proptest::collection::vec(
                proptest::collection::vec(proptest::option::of(-1.0e3f64..1.0e3), len),
                regions * columns,
            )
            .prop_map(move |data| {
                let index = (0..len)
                    .map(|i| t0() + TimeDelta::seconds(step * i as i64))
                    .collect();
                let mut table = SequenceTable::with_index(index);
                for (i, values) in data.into_iter().enumerate() {
                    let name = format!("col{}_R{}", i / regions, i % regions);
                    table.insert_column(name, values).unwrap();
                }
                table
            })
        })
}

proptest! {
    #[test]
    fn wide_to_tall_to_wide_roundtrip(table in arb_wide()) {
        let step = if table.len() > 1 {
            table.index()[1] - table.index()[0]
        } else {
            TimeDelta::hours(1)
        };
        let rows = to_tall(&table, step);
        prop_assert_eq!(rows.len(), table.columns().len());
        let back = reshape(&rows).unwrap();
        prop_assert_eq!(back, table);
    }
}
