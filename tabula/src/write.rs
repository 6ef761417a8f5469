//! Persisting a [`DataPackage`] as semicolon-separated tables plus manifest.
//!
//! Layout below the destination:
//!
//! - `data/elements/<facade>.csv` and `data/elements/bus.csv`
//! - `data/sequences/<process>_sequence.csv`
//! - `data/periods/periods.csv`
//! - `data/tsam/tsa_parameters.csv` (only after typical-period aggregation)
//! - `datapackage.json`

use std::fs;
use std::path::Path;

use tabula_core::timeseries::reshape::TIMESTAMP_FORMAT;
use tabula_core::{PeriodTable, SequenceTable, sequence_resource};
use tabula_types::{AdapterError, Row, Value};

use crate::manifest::Manifest;
use crate::package::DataPackage;

/// Directory of the element tables.
pub const ELEMENTS_DIR: &str = "data/elements";
/// Directory of the sequence tables.
pub const SEQUENCES_DIR: &str = "data/sequences";
/// Directory of the period table.
pub const PERIODS_DIR: &str = "data/periods";
/// Directory of the typical-period parameters.
pub const TSAM_DIR: &str = "data/tsam";
/// File name of the bus table inside [`ELEMENTS_DIR`].
pub const BUS_RESOURCE_FILE: &str = "bus.csv";
/// File name of the manifest.
pub const MANIFEST_FILE: &str = "datapackage.json";
/// Index column of sequence and period tables.
pub const TIMEINDEX: &str = "timeindex";

const DELIMITER: u8 = b';';

fn csv_error(e: csv::Error) -> AdapterError {
    AdapterError::Serialization(e.to_string())
}

fn write_table<H, R>(path: &Path, header: &[H], rows: R) -> Result<(), AdapterError>
where
    H: AsRef<[u8]>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)
        .map_err(csv_error)?;
    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_rows(path: &Path, columns: &[String], rows: &[Row]) -> Result<(), AdapterError> {
    write_table(
        path,
        columns,
        rows.iter().map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).map(Value::to_cell).unwrap_or_default())
                .collect()
        }),
    )
}

fn write_sequences(path: &Path, table: &SequenceTable) -> Result<(), AdapterError> {
    let header: Vec<String> = std::iter::once(TIMEINDEX.to_string())
        .chain(table.column_names())
        .collect();
    let columns: Vec<&Vec<Option<f64>>> = table.columns().values().collect();
    write_table(
        path,
        &header,
        table.index().iter().enumerate().map(|(i, ts)| {
            std::iter::once(ts.format(TIMESTAMP_FORMAT).to_string())
                .chain(columns.iter().map(|col| Value::from(col[i]).to_cell()))
                .collect()
        }),
    )
}

fn write_periods(path: &Path, periods: &PeriodTable) -> Result<(), AdapterError> {
    write_table(
        path,
        &[TIMEINDEX, "periods", "timeincrement"],
        periods.rows().iter().map(|r| {
            vec![
                r.timeindex.format(TIMESTAMP_FORMAT).to_string(),
                r.period.to_string(),
                Value::Float(r.timeincrement).to_cell(),
            ]
        }),
    )
}

/// Write `package` below `destination`.
///
/// Directories are created as needed and existing files are overwritten.
/// List and dict cells are written as JSON, missing cells as empty fields.
///
/// # Errors
/// Returns `AdapterError::Io` for filesystem failures and
/// `AdapterError::Serialization` for encoding failures.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        target = "tabula::write",
        skip(package, destination),
        fields(package = %package.name, destination = %destination.as_ref().display()),
    )
)]
pub fn write(package: &DataPackage, destination: impl AsRef<Path>) -> Result<(), AdapterError> {
    let root = destination.as_ref();
    let elements = root.join(ELEMENTS_DIR);
    fs::create_dir_all(&elements)?;

    for (facade, table) in &package.elements {
        write_rows(
            &elements.join(format!("{facade}.csv")),
            &table.column_names(),
            &table.rows,
        )?;
    }
    if !package.busses.is_empty() {
        let columns = ["name", "type", "balanced"].map(String::from);
        write_rows(
            &elements.join(BUS_RESOURCE_FILE),
            &columns,
            &package.busses.rows(),
        )?;
    }

    if !package.sequences.is_empty() {
        let dir = root.join(SEQUENCES_DIR);
        fs::create_dir_all(&dir)?;
        for (process, table) in &package.sequences {
            write_sequences(&dir.join(format!("{}.csv", sequence_resource(process))), table)?;
        }
    }

    if !package.periods.is_empty() {
        let dir = root.join(PERIODS_DIR);
        fs::create_dir_all(&dir)?;
        write_periods(&dir.join("periods.csv"), &package.periods)?;
    }

    if !package.tsa_parameters.is_empty() {
        let dir = root.join(TSAM_DIR);
        fs::create_dir_all(&dir)?;
        let rows: Vec<Row> = package.tsa_parameters.iter().map(|p| p.to_row()).collect();
        let columns: Vec<String> = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        write_rows(&dir.join("tsa_parameters.csv"), &columns, &rows)?;
    }

    let manifest = Manifest::from_package(package);
    fs::write(root.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        target: "tabula::write",
        resources = manifest.resources.len(),
        "datapackage written"
    );
    Ok(())
}
