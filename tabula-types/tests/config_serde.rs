use tabula_types::{
    AdapterSettings, BusGroup, CalculationMode, ClusterMethod, MappingConfig, MappingContext,
    Representation, Structure, TsamConfig,
};

const CONFIG: &str = r#"{
    "parameter_map": {
        "DEFAULT": {"capacity": "installed_capacity"},
        "modex_tech_wind_turbine_onshore": {"profile": "onshore"}
    },
    "bus_map": {
        "ExtractionTurbineAdapter": {"fuel_bus": "ch4", "heat_bus": "heat_central"}
    },
    "process_adapter_map": {
        "modex_tech_wind_turbine_onshore": "VolatileAdapter",
        "modex_tech_chp": "ExtractionTurbineAdapter"
    },
    "structures": {
        "modex_tech_wind_turbine_onshore": {
            "default": {"inputs": [], "outputs": ["electricity"]}
        },
        "modex_tech_chp": {
            "default": {"inputs": ["ch4"], "outputs": ["electricity", "heat_central"]},
            "emissions": {"outputs": ["co2"]}
        }
    }
}"#;

#[test]
fn mapping_config_loads_nested_json() {
    let cfg = MappingConfig::from_json_str(CONFIG).expect("parse config");

    assert_eq!(
        cfg.adapter_for("modex_tech_chp"),
        Some("ExtractionTurbineAdapter")
    );
    assert_eq!(cfg.adapter_for("unknown"), None);

    let ctx = MappingContext::new(
        Some("modex_tech_wind_turbine_onshore"),
        Some("VolatileAdapter"),
        Some("volatile"),
    );
    assert_eq!(
        cfg.parameter_map.lookup("profile", &ctx).map(|h| h.0),
        Some("onshore")
    );
    assert_eq!(
        cfg.parameter_map.lookup("capacity", &ctx).map(|h| h.0),
        Some("installed_capacity")
    );

    let chp = &cfg.structures["modex_tech_chp"];
    let emissions = chp.group("emissions").expect("emissions group");
    assert!(emissions.inputs.is_empty());
    assert_eq!(emissions.outputs, vec!["co2".to_string()]);
}

#[test]
fn mapping_config_roundtrip_is_lossless() {
    let cfg = MappingConfig::from_json_str(CONFIG).expect("parse config");
    let json = serde_json::to_string(&cfg).expect("serialize");
    let back: MappingConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(cfg, back);
    // Declaration order of scopes and groups survives the roundtrip.
    let scopes: Vec<&str> = back.parameter_map.scope_names().collect();
    assert_eq!(scopes, vec!["DEFAULT", "modex_tech_wind_turbine_onshore"]);
}

#[test]
fn invalid_config_is_a_config_error() {
    let err = MappingConfig::from_json_str(r#"{"structures": 3}"#).unwrap_err();
    assert!(matches!(err, tabula_types::AdapterError::Config(_)));
}

#[test]
fn settings_fill_defaults() {
    let s: AdapterSettings = serde_json::from_str(r#"{"calculation_mode": "Lenient"}"#).unwrap();
    assert_eq!(s.calculation_mode, CalculationMode::Lenient);
    assert_eq!(s.seed, 42);
    assert!(s.parallel);
    assert!(!s.fail_fast);
    assert!(s.tsam.is_none());

    let s: AdapterSettings =
        serde_json::from_str(r#"{"tsam": {"typical_periods": 4, "cluster_method": "KMedoids"}}"#)
            .unwrap();
    let tsam = s.tsam.expect("tsam config");
    assert_eq!(tsam.typical_periods, 4);
    assert_eq!(tsam.hours_per_period, 24);
    assert_eq!(tsam.cluster_method, ClusterMethod::KMedoids);
    assert_eq!(tsam.representation, Representation::Medoid);
    assert_eq!(TsamConfig::default().seed, 42);
}

#[test]
fn structure_serializes_as_plain_map() {
    let s = Structure::new().with_group("default", BusGroup::new(["ch4"], ["electricity"]));
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(
        v,
        serde_json::json!({"default": {"inputs": ["ch4"], "outputs": ["electricity"]}})
    );
}
