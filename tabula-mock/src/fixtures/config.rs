use tabula_types::{BusGroup, BusMap, DEFAULT_SCOPE, MappingConfig, ParameterMap, Structure};

/// `(process, adapter, inputs, outputs)` of every fixture process.
const PROCESSES: [(&str, &str, &[&str], &[&str]); 7] = [
    ("wind_onshore", "VolatileAdapter", &[], &["electricity"]),
    ("pv_utility", "VolatileAdapter", &[], &["electricity"]),
    ("gas_chp", "ExtractionTurbineAdapter", &["ch4"], &["electricity", "heat_central"]),
    ("battery", "StorageAdapter", &["electricity"], &["electricity"]),
    ("demand", "LoadAdapter", &["electricity"], &[]),
    ("transmission", "LinkAdapter", &["electricity"], &["electricity_import"]),
    ("broken_gt", "ConversionAdapter", &["ch4", "h2"], &["electricity"]),
];

pub fn names() -> impl Iterator<Item = &'static str> {
    PROCESSES.iter().map(|(name, ..)| *name)
}

pub fn adapter(process: &str) -> Option<&'static str> {
    PROCESSES
        .iter()
        .find(|(name, ..)| *name == process)
        .map(|(_, adapter, ..)| *adapter)
}

pub fn structure(process: &str) -> Option<Structure> {
    let (.., inputs, outputs) = PROCESSES.iter().find(|(name, ..)| *name == process)?;
    let mut structure = Structure::single(inputs.iter().copied(), outputs.iter().copied());
    if process == "gas_chp" {
        structure = structure.with_group("emissions", BusGroup::new(["ch4"], ["co2"]));
    }
    Some(structure)
}

pub fn parameter_map() -> ParameterMap {
    ParameterMap::new()
        .with(DEFAULT_SCOPE, "capacity", "installed_capacity")
        .with("wind_onshore", "profile", "onshore")
        .with("pv_utility", "profile", "pv")
        .with("LoadAdapter", "amount", "annual_demand")
        .with("ExtractionTurbineAdapter", "electric_efficiency", "eta_el")
        .with("ExtractionTurbineAdapter", "thermal_efficiency", "eta_th")
        .with("ExtractionTurbineAdapter", "condensing_efficiency", "eta_cond")
}

pub fn bus_map() -> BusMap {
    BusMap::new().with("ExtractionTurbineAdapter", "heat_bus", "heat_central")
}

pub fn mapping_config() -> MappingConfig {
    let mut config = MappingConfig {
        parameter_map: parameter_map(),
        bus_map: bus_map(),
        ..MappingConfig::default()
    };
    for name in names() {
        if let (Some(adapter), Some(structure)) = (adapter(name), structure(name)) {
            config
                .process_adapter_map
                .insert(name.to_string(), adapter.to_string());
            config.structures.insert(name.to_string(), structure);
        }
    }
    config
}
