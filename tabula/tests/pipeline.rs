use tabula::{
    Adapter, AdapterBuilder, AdapterError, CalculationMode, DEFAULT_SCOPE, DiagnosticKind,
    ForeignKey, ParameterMap, ProcessData, Row, Structure, Timeseries, TsamConfig, Value,
};
use tabula_mock::{DAYS, FAILING_PROCESS, MockCollection, YEARS};

fn mock_builder() -> AdapterBuilder {
    let mock = MockCollection::new();
    let mut b = Adapter::builder().mapping(mock.mapping_config());
    for (name, data) in mock.processes() {
        b = b.process_data(name, data);
    }
    b
}

fn names(rows: &[Row]) -> Vec<&str> {
    rows.iter().filter_map(|r| r["name"].as_str()).collect()
}

fn by_name<'a>(rows: &'a [Row], name: &str) -> &'a Row {
    rows.iter()
        .find(|r| r["name"].as_str() == Some(name))
        .unwrap_or_else(|| panic!("no component {name}"))
}

#[test]
fn mock_collection_builds_every_table() {
    let pkg = mock_builder().build().unwrap().build_package().unwrap();
    assert!(pkg.failures.is_empty(), "{:?}", pkg.failures);

    let facades: Vec<&str> = pkg.elements.keys().map(String::as_str).collect();
    assert_eq!(facades, ["volatile", "extraction_turbine", "storage", "load", "link"]);

    let volatile = &pkg.element("volatile").unwrap().rows;
    assert_eq!(names(volatile), ["BB_wind_onshore", "BE_wind_onshore", "BB_solar_pv"]);

    let busses: Vec<&str> = pkg.busses.names().collect();
    assert_eq!(busses, ["ch4", "electricity", "electricity_import", "heat_central"]);

    let sequences: Vec<&str> = pkg.sequences.keys().map(String::as_str).collect();
    assert_eq!(sequences, ["wind_onshore", "pv_utility", "demand"]);
    assert_eq!(
        pkg.sequence("wind_onshore").unwrap().column_names(),
        ["onshore_BB", "onshore_BE"]
    );

    assert_eq!(pkg.periods.rows().len(), YEARS.len() * DAYS * 24);
    assert_eq!(pkg.periods.periods(), vec![0, 1, 2]);
    assert!(pkg.tsa_parameters.is_empty());
}

#[test]
fn wind_record_is_decommissioned_and_costed() {
    let pkg = mock_builder().build().unwrap().build_package().unwrap();
    let volatile = &pkg.element("volatile").unwrap().rows;

    let bb = by_name(volatile, "BB_wind_onshore");
    assert_eq!(bb["type"], Value::from("volatile"));
    assert_eq!(bb["bus"], Value::from("electricity"));
    assert_eq!(bb["capacity"], Value::Float(100.0));
    assert_eq!(bb["max"], Value::floats(&[1.0, 1.0, 0.5]));
    assert_eq!(bb["profile"], Value::from("onshore_BB"));
    assert_eq!(bb["lifetime"], Value::Int(20));
    let cost = bb["capacity_cost"].as_list().unwrap();
    assert_eq!(cost.len(), 3);
    assert!(cost[0].as_f64().unwrap() > cost[1].as_f64().unwrap());
    assert!(!bb.contains_key("year"));

    // Single-year region is padded to the per-period length of its table.
    let be = by_name(volatile, "BE_wind_onshore");
    assert_eq!(be["capacity"], Value::Float(30.0));
    assert_eq!(be["profile"], Value::from("onshore_BE"));
    assert_eq!(be["capacity_cost"].as_list().map(<[Value]>::len), Some(3));
}

#[test]
fn busses_follow_structure_and_overrides() {
    let pkg = mock_builder().build().unwrap().build_package().unwrap();
    let chp = &pkg.element("extraction_turbine").unwrap().rows[0];
    assert_eq!(chp["fuel_bus"], Value::from("ch4"));
    assert_eq!(chp["electricity_bus"], Value::from("electricity"));
    assert_eq!(chp["heat_bus"], Value::from("heat_central"));
    assert_eq!(chp["electric_efficiency"], Value::floats(&[0.35, 0.38]));
    assert_eq!(chp["capacity"], Value::Float(80.0));
    assert_eq!(chp["max"], Value::floats(&[1.0, 0.75]));

    let link = &pkg.element("link").unwrap().rows[0];
    assert_eq!(link["from_bus"], Value::from("electricity"));
    assert_eq!(link["to_bus"], Value::from("electricity_import"));
}

#[test]
fn foreign_keys_reference_busses_and_sequences() {
    let pkg = mock_builder().build().unwrap().build_package().unwrap();
    assert_eq!(
        pkg.foreign_keys("volatile"),
        [
            ForeignKey::bus("bus"),
            ForeignKey::sequence("profile", "wind_onshore"),
            ForeignKey::sequence("profile", "pv_utility"),
        ]
    );
    assert_eq!(
        pkg.foreign_keys("link"),
        [ForeignKey::bus("from_bus"), ForeignKey::bus("to_bus")]
    );
    // Demand has one timeseries column and falls back to it.
    assert_eq!(
        pkg.foreign_keys("load"),
        [ForeignKey::bus("bus"), ForeignKey::sequence("profile", "demand")]
    );
    assert_eq!(pkg.diagnostics_of(DiagnosticKind::SequenceFallback).count(), 1);
}

#[test]
fn failing_process_is_skipped() {
    let mock = MockCollection::new();
    let pkg = mock_builder()
        .process_data(FAILING_PROCESS, mock.process(FAILING_PROCESS).unwrap())
        .build()
        .unwrap()
        .build_package()
        .unwrap();

    assert_eq!(pkg.failures.len(), 1);
    match &pkg.failures[0] {
        AdapterError::ProcessFailed { process, error } => {
            assert_eq!(process, FAILING_PROCESS);
            assert!(error.is_mapping(), "{error:?}");
        }
        other => panic!("unexpected {other:?}"),
    }
    let skipped: Vec<_> = pkg.diagnostics_of(DiagnosticKind::ProcessSkipped).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].process.as_deref(), Some(FAILING_PROCESS));
    assert!(pkg.element("conversion").is_none());
    assert_eq!(pkg.elements.len(), 5);
}

#[test]
fn fail_fast_aborts_the_run() {
    let mock = MockCollection::new();
    let err = mock_builder()
        .process_data(FAILING_PROCESS, mock.process(FAILING_PROCESS).unwrap())
        .fail_fast(true)
        .build()
        .unwrap()
        .build_package()
        .unwrap_err();
    assert!(matches!(err, AdapterError::ProcessFailed { ref process, .. } if process == FAILING_PROCESS));
}

#[test]
fn all_processes_failing_is_an_error() {
    let mock = MockCollection::new();
    let err = Adapter::builder()
        .mapping(mock.mapping_config())
        .process_data(FAILING_PROCESS, mock.process(FAILING_PROCESS).unwrap())
        .build()
        .unwrap()
        .build_package()
        .unwrap_err();
    match err {
        AdapterError::AllProcessesFailed(errors) => assert_eq!(errors.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let parallel = mock_builder().parallel(true).build().unwrap().build_package().unwrap();
    let sequential = mock_builder().parallel(false).build().unwrap().build_package().unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn names_are_unique_across_processes() {
    let mock = MockCollection::new();
    let wind = mock.process("wind_onshore").unwrap();
    let structure = Structure::single(Vec::<String>::new(), ["electricity"]);
    let pkg = Adapter::builder()
        .process("wind_a", "VolatileAdapter", structure.clone(), wind.clone())
        .process("wind_b", "VolatileAdapter", structure, wind)
        .build()
        .unwrap()
        .build_package()
        .unwrap();
    let rows = &pkg.element("volatile").unwrap().rows;
    assert_eq!(
        names(rows),
        ["BB_wind_onshore", "BE_wind_onshore", "BB_wind_onshore_1", "BE_wind_onshore_1"]
    );
    let collisions: Vec<_> = pkg.diagnostics_of(DiagnosticKind::NameCollision).collect();
    assert_eq!(collisions.len(), 2);
    assert!(collisions.iter().all(|d| d.process.as_deref() == Some("wind_b")));
}

fn bad_wacc_adapter(mode: CalculationMode) -> Adapter {
    let mut row = Row::new();
    row.insert("region".into(), Value::from("BB"));
    row.insert("carrier".into(), Value::from("wind"));
    row.insert("tech".into(), Value::from("offshore"));
    row.insert("capacity".into(), Value::Float(5.0));
    row.insert("overnight_cost".into(), Value::Float(2000.0));
    row.insert("lifetime".into(), Value::Float(25.0));
    row.insert("wacc".into(), Value::Float(1.5));
    Adapter::builder()
        .process(
            "offshore",
            "VolatileAdapter",
            Structure::single(Vec::<String>::new(), ["electricity"]),
            ProcessData::new(vec![row]),
        )
        .calculation_mode(mode)
        .build()
        .unwrap()
}

#[test]
fn calculation_failures_follow_the_mode() {
    let err = bad_wacc_adapter(CalculationMode::Strict)
        .build_package()
        .unwrap_err();
    let AdapterError::AllProcessesFailed(errors) = err else {
        panic!("unexpected {err:?}");
    };
    assert!(matches!(
        &errors[0],
        AdapterError::ProcessFailed { error, .. } if error.is_calculation()
    ));

    let pkg = bad_wacc_adapter(CalculationMode::Lenient).build_package().unwrap();
    let row = &pkg.element("volatile").unwrap().rows[0];
    assert!(row["capacity_cost"].is_missing());
    assert_eq!(row["capacity"], Value::Float(5.0));
    assert_eq!(pkg.diagnostics_of(DiagnosticKind::CalculationNulled).count(), 1);
}

#[test]
fn periods_fall_back_to_years_without_sequences() {
    let mock = MockCollection::new();
    let pkg = Adapter::builder()
        .mapping(mock.mapping_config())
        .process_data("gas_chp", mock.process("gas_chp").unwrap())
        .build()
        .unwrap()
        .build_package()
        .unwrap();
    assert!(pkg.sequences.is_empty());
    let stamps: Vec<String> = pkg
        .periods
        .rows()
        .iter()
        .map(|r| r.timeindex.format("%Y-%m-%d").to_string())
        .collect();
    assert_eq!(stamps, ["2016-01-01", "2030-01-01"]);
    assert_eq!(pkg.periods.periods(), vec![0, 1]);
}

#[test]
fn typical_periods_reduce_every_sequence() {
    let pkg = mock_builder()
        .tsam(TsamConfig {
            typical_periods: 1,
            hours_per_period: 24,
            ..TsamConfig::default()
        })
        .build()
        .unwrap()
        .build_package()
        .unwrap();
    assert_eq!(pkg.tsa_parameters.len(), YEARS.len());
    assert!(pkg.tsa_parameters.iter().all(|p| p.order == vec![0; DAYS]));
    assert_eq!(pkg.periods.rows().len(), YEARS.len() * 24);
    for table in pkg.sequences.values() {
        assert_eq!(table.len(), YEARS.len() * 24);
    }
    assert_eq!(
        pkg.sequence("pv_utility").unwrap().column_names(),
        ["pv_BB", "pv_BE"]
    );
}

#[test]
fn builder_rejects_empty_and_unassigned_processes() {
    assert!(matches!(Adapter::builder().build(), Err(AdapterError::Config(_))));
    let err = Adapter::builder()
        .process_data("nobody", ProcessData::default())
        .build()
        .unwrap_err();
    assert!(matches!(err, AdapterError::Config(ref msg) if msg.contains("nobody")));
}

#[test]
fn materialized_rows_carry_schema_defaults() {
    let pkg = mock_builder().build().unwrap().build_package().unwrap();
    let rows = pkg.materialized("link").unwrap();
    assert_eq!(rows[0]["limit_direction"], Value::Bool(false));
    assert_eq!(rows[0]["loss"], Value::Float(0.03));
    assert!(!pkg.element("link").unwrap().rows[0].contains_key("limit_direction"));
}

fn onshore_row(year: i64, capacity: f64) -> Row {
    let mut row = Row::new();
    row.insert("region".into(), Value::from("BB"));
    row.insert("carrier".into(), Value::from("wind"));
    row.insert("tech".into(), Value::from("onshore"));
    row.insert("year".into(), Value::Int(year));
    row.insert("installed_capacity".into(), Value::Float(capacity));
    row
}

#[test]
fn single_profile_column_leaves_max_to_decommissioning() {
    let mut ts = Row::new();
    ts.insert("region".into(), Value::from("BB"));
    ts.insert("timeindex_start".into(), Value::from("2016-01-01T00:00:00"));
    ts.insert("timeindex_stop".into(), Value::from("2016-01-01T03:00:00"));
    ts.insert("timeindex_resolution".into(), Value::from("PT1H"));
    ts.insert("onshore".into(), Value::floats(&[0.1, 0.4, 0.8, 0.3]));
    let data = ProcessData::new(vec![
        onshore_row(2016, 100.0),
        onshore_row(2030, 100.0),
        onshore_row(2050, 50.0),
    ])
    .with_timeseries(Timeseries::Tall(vec![ts]));

    let pkg = Adapter::builder()
        .parameter_map(
            ParameterMap::new()
                .with(DEFAULT_SCOPE, "capacity", "installed_capacity")
                .with("wind", "profile", "onshore"),
        )
        .process(
            "wind",
            "VolatileAdapter",
            Structure::single(Vec::<String>::new(), ["electricity"]),
            data,
        )
        .build()
        .unwrap()
        .build_package()
        .unwrap();

    assert!(pkg.failures.is_empty(), "{:?}", pkg.failures);
    let row = &pkg.element("volatile").unwrap().rows[0];
    assert_eq!(row["profile"], Value::from("onshore_BB"));
    assert_eq!(row["capacity"], Value::Float(100.0));
    assert_eq!(row["max"], Value::floats(&[1.0, 1.0, 0.5]));
    assert_eq!(pkg.diagnostics_of(DiagnosticKind::SequenceFallback).count(), 0);
    assert_eq!(
        pkg.foreign_keys("volatile"),
        [ForeignKey::bus("bus"), ForeignKey::sequence("profile", "wind")]
    );
}
