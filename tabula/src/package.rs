//! The pure `build` step and its result.

use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use tabula_core::schema;
use tabula_core::{
    BusTable, ElementTable, ForeignKey, NameCounter, PeriodTable, ProcessData, SequenceTable,
    TsaParameters, aggregate_periods,
};
use tabula_types::{AdapterError, Diagnostic, DiagnosticKind, Diagnostics, Row, Value};

use crate::core::Adapter;
use crate::pipeline::{self, ProcessOutput};

/// Separates the process name from the column name while sequences of all
/// processes are aggregated together.
const PROCESS_SEPARATOR: &str = "/";

/// Result of one pipeline run, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPackage {
    /// Package name used in the manifest.
    pub name: String,
    /// Element tables by facade type, in first-seen order.
    pub elements: IndexMap<String, ElementTable>,
    /// Wide sequence tables by process name.
    pub sequences: IndexMap<String, SequenceTable>,
    /// Every bus referenced by an element table.
    pub busses: BusTable,
    /// Global period table.
    pub periods: PeriodTable,
    /// Reconstruction metadata of the typical-period aggregation; empty when
    /// it did not run.
    pub tsa_parameters: Vec<TsaParameters>,
    /// Non-fatal findings of all processes.
    pub diagnostics: Vec<Diagnostic>,
    /// Processes that were skipped, as `ProcessFailed` errors.
    pub failures: Vec<AdapterError>,
}

impl DataPackage {
    /// Element table of a facade type.
    #[must_use]
    pub fn element(&self, facade: &str) -> Option<&ElementTable> {
        self.elements.get(facade)
    }

    /// Sequence table of a process.
    #[must_use]
    pub fn sequence(&self, process: &str) -> Option<&SequenceTable> {
        self.sequences.get(process)
    }

    /// Foreign keys of a facade's element table.
    #[must_use]
    pub fn foreign_keys(&self, facade: &str) -> &[ForeignKey] {
        self.elements
            .get(facade)
            .map(|t| t.foreign_keys.as_slice())
            .unwrap_or_default()
    }

    /// Element rows of `facade` with schema defaults filled in.
    #[must_use]
    pub fn materialized(&self, facade: &str) -> Option<Vec<Row>> {
        let schema = schema::by_facade(facade)?;
        let table = self.elements.get(facade)?;
        Some(table.rows.iter().map(|r| schema.materialize(r)).collect())
    }

    /// Diagnostics of a given kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Write the package below `destination`; see [`crate::write::write`].
    ///
    /// # Errors
    /// See [`crate::write::write`].
    pub fn write(&self, destination: impl AsRef<Path>) -> Result<(), AdapterError> {
        crate::write::write(self, destination)
    }
}

/// Run every process of `adapter` and merge the results.
///
/// Processes run independently, on the rayon pool when
/// `settings.parallel` is set, and are merged in registration order, so
/// the result does not depend on scheduling. A failing process is skipped
/// with a `ProcessSkipped` diagnostic unless `fail_fast` is set. Component
/// names are made unique across processes. The bus table is collected from
/// the bus role columns of all element tables. Periods come from the
/// sequence timestamps or, without sequences, from the source years.
///
/// # Errors
/// `ProcessFailed` when `fail_fast` is set and a process fails,
/// `AllProcessesFailed` when no process succeeds, and any error of the
/// typical-period aggregation.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        target = "tabula::build",
        skip(adapter),
        fields(processes = adapter.processes().len(), parallel = adapter.settings().parallel),
    )
)]
pub fn build(adapter: &Adapter) -> Result<DataPackage, AdapterError> {
    let settings = adapter.settings();
    let jobs: Vec<(&String, &ProcessData)> = adapter.processes().iter().collect();
    let run = |&(name, data): &(&String, &ProcessData)| {
        let mut diags = Diagnostics::for_process(name.as_str());
        let result = pipeline::run_process(name, data, adapter.config(), settings, &mut diags);
        (name.clone(), result, diags)
    };
    let results: Vec<(String, Result<ProcessOutput, AdapterError>, Diagnostics)> =
        if settings.parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

    let mut names = NameCounter::new();
    let mut diagnostics = Diagnostics::new();
    let mut failures: Vec<AdapterError> = Vec::new();
    let mut elements: IndexMap<String, ElementTable> = IndexMap::new();
    let mut sequences: IndexMap<String, SequenceTable> = IndexMap::new();
    let mut busses = BusTable::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();

    for (process, result, mut diags) in results {
        match result {
            Ok(out) => {
                let ProcessOutput {
                    schema,
                    mut rows,
                    foreign_keys,
                    sequences: table,
                    years: process_years,
                } = out;
                for row in &mut rows {
                    let Some(base) = row.get("name").and_then(Value::key_part) else {
                        continue;
                    };
                    let unique = names.claim(&base, &mut diags);
                    if unique != base {
                        row.insert("name".to_string(), Value::Str(unique));
                    }
                    for role in schema.bus_roles() {
                        if let Some(bus) = row.get(role).and_then(Value::as_str) {
                            busses.insert(bus);
                        }
                    }
                }
                elements
                    .entry(schema.facade.to_string())
                    .or_insert_with(|| ElementTable::new(schema.facade))
                    .append(rows, foreign_keys);
                if !table.is_empty() {
                    sequences.insert(process, table);
                }
                years.extend(process_years);
            }
            Err(error) => {
                diags.push(DiagnosticKind::ProcessSkipped, format!("skipped: {error}"));
                let failure = AdapterError::process_failed(process.as_str(), error);
                if settings.fail_fast {
                    return Err(failure);
                }
                failures.push(failure);
            }
        }
        diagnostics.absorb(diags);
    }

    if elements.is_empty() && !failures.is_empty() {
        return Err(AdapterError::AllProcessesFailed(failures));
    }

    let mut periods = if sequences.is_empty() {
        PeriodTable::from_years(years)
    } else {
        let stamps: Vec<_> = sequences
            .values()
            .flat_map(|t| t.index().iter().copied())
            .collect();
        PeriodTable::from_timeindex(&stamps)
    };

    let mut tsa_parameters = Vec::new();
    if let Some(config) = settings.tsam.as_ref().filter(|_| !sequences.is_empty()) {
        let combined = SequenceTable::merge(
            sequences
                .iter()
                .map(|(p, t)| t.prefixed(&format!("{p}{PROCESS_SEPARATOR}"))),
        );
        let aggregated = aggregate_periods(&combined, &periods, config)?;
        for (process, table) in &mut sequences {
            *table = aggregated
                .sequences
                .strip_prefix(&format!("{process}{PROCESS_SEPARATOR}"));
        }
        periods = aggregated.periods;
        tsa_parameters = aggregated.parameters;
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        target: "tabula::build",
        element_tables = elements.len(),
        sequence_tables = sequences.len(),
        busses = busses.len(),
        failures = failures.len(),
        diagnostics = diagnostics.len(),
        "datapackage built"
    );

    Ok(DataPackage {
        name: settings.package_name.clone(),
        elements,
        sequences,
        busses,
        periods,
        tsa_parameters,
        diagnostics: diagnostics.into_vec(),
        failures,
    })
}
