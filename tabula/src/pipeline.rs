//! Per-process pipeline: sequences, bus resolution, aggregation, build and
//! foreign keys.

use tabula_core::foreign_keys;
use tabula_core::schema::{self, FacadeSchema};
use tabula_core::{
    BusResolver, ComponentBuilder, ForeignKey, KeyResolver, NameCounter, PeriodicAggregator,
    ProcessData, SequenceTable, Timeseries, pad_mixed_columns, reshape,
};
use tabula_types::{
    AdapterError, AdapterSettings, Diagnostics, MappingConfig, MappingContext, Row, Value,
};

/// Everything one process contributes to the datapackage.
#[derive(Debug, Clone)]
pub(crate) struct ProcessOutput {
    pub schema: &'static FacadeSchema,
    pub rows: Vec<Row>,
    pub foreign_keys: Vec<ForeignKey>,
    pub sequences: SequenceTable,
    pub years: Vec<i32>,
}

#[allow(clippy::cast_possible_truncation)]
fn year_of(v: &Value) -> Option<i32> {
    match v {
        Value::Int(y) => i32::try_from(*y).ok(),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < 1.0e6 => Some(*f as i32),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn sequences_of(data: &ProcessData) -> Result<SequenceTable, AdapterError> {
    match &data.timeseries {
        Timeseries::None => Ok(SequenceTable::new()),
        Timeseries::Tall(rows) => reshape(rows),
        Timeseries::Wide(table) => Ok(table.clone()),
    }
}

/// Run one process end to end.
///
/// # Errors
/// `Config` for a missing adapter, schema or structure, `Data` for
/// malformed timeseries, `Mapping` for unresolvable busses and, in strict
/// mode, `Calculation` for failed derived fields.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        target = "tabula::pipeline",
        skip(data, config, settings, diags),
        fields(rows = data.scalars.len()),
    )
)]
pub(crate) fn run_process(
    process: &str,
    data: &ProcessData,
    config: &MappingConfig,
    settings: &AdapterSettings,
    diags: &mut Diagnostics,
) -> Result<ProcessOutput, AdapterError> {
    let adapter = config
        .adapter_for(process)
        .ok_or_else(|| AdapterError::Config(format!("no adapter assigned to '{process}'")))?;
    let schema = schema::by_adapter(adapter)
        .ok_or_else(|| AdapterError::Config(format!("unknown adapter '{adapter}'")))?;
    let structure = config
        .structures
        .get(process)
        .ok_or_else(|| AdapterError::Config(format!("no structure for '{process}'")))?;

    let sequences = sequences_of(data)?;
    let columns = sequences.column_names();
    let ctx = MappingContext::new(Some(process), Some(adapter), Some(schema.facade));
    let keys = KeyResolver::new(&config.parameter_map, ctx, &columns);
    let busses = BusResolver::new(&config.bus_map, ctx).resolve(schema, structure, diags)?;

    let region = keys.resolve("region", diags);
    let carrier = keys.resolve("carrier", diags);
    let tech = keys.resolve("tech", diags);
    let year = keys.resolve("year", diags);
    let mut years: Vec<i32> = data
        .scalars
        .iter()
        .filter_map(|r| r.get(year).and_then(year_of))
        .collect();
    years.sort_unstable();
    years.dedup();

    let aggregated = PeriodicAggregator::new(settings.seed)
        .with_fields([region, carrier, tech], year)
        .aggregate_rows(&data.scalars, diags);

    let builder = ComponentBuilder::new(schema, keys, busses, settings.calculation_mode);
    let mut names = NameCounter::new();
    let mut rows = aggregated
        .iter()
        .map(|r| builder.build(r, &mut names, diags))
        .collect::<Result<Vec<_>, _>>()?;
    pad_mixed_columns(&mut rows);

    let foreign_keys =
        foreign_keys::derive(schema, builder.busses(), &rows, &columns, process, diags);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "tabula::pipeline",
        process,
        facade = schema.facade,
        components = rows.len(),
        sequence_columns = columns.len(),
        "process built"
    );

    Ok(ProcessOutput {
        schema,
        rows,
        foreign_keys,
        sequences,
        years,
    })
}
