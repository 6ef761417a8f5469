//! Tabula turns per-technology energy-process records into a tabular
//! datapackage for energy-system optimizers.
//!
//! Overview
//! - Each process names an adapter (a downstream component type such as
//!   `VolatileAdapter`) and a bus structure.
//! - Source fields are mapped onto schema fields through a scoped parameter
//!   map (process > adapter > facade > `DEFAULT`); unmapped keys are used
//!   verbatim.
//! - Bus roles are resolved from the bus map, by cardinality, or by the most
//!   similar bus name.
//! - Rows of several years collapse into one record per region, carrier and
//!   tech; varying fields become per-period lists, and gaps are imputed with a
//!   seeded generator.
//! - Derived fields: `capacity_cost` (annuity plus fixed cost), decommissioning
//!   of per-period capacity into `max` fractions, floored `lifetime`.
//! - Tall timeseries are reshaped into wide `<column>_<region>` tables, with
//!   optional typical-period aggregation.
//!
//! Key behaviors and trade-offs
//! - A failing process is skipped with a diagnostic; `fail_fast` aborts the run
//!   instead.
//! - `CalculationMode::Lenient` nulls failed derived fields instead of failing
//!   the process.
//! - Processes run on the rayon pool but are merged in registration order, so
//!   the output equals a sequential run.
//!
//! Example
//! ```rust,ignore
//! use tabula::{Adapter, ProcessData, Structure};
//!
//! let adapter = Adapter::builder()
//!     .process(
//!         "wind",
//!         "VolatileAdapter",
//!         Structure::single(Vec::<String>::new(), ["electricity"]),
//!         ProcessData::new(rows),
//!     )
//!     .build()?;
//! let package = tabula::build(&adapter)?;
//! tabula::write(&package, "out")?;
//! ```
//!
//! See `tabula/examples/` for a runnable demonstration.
#![warn(missing_docs)]

pub(crate) mod core;
/// The `datapackage.json` manifest.
pub mod manifest;
pub(crate) mod pipeline;
mod package;
/// Writing packages to disk.
pub mod write;

pub use core::{Adapter, AdapterBuilder};
pub use manifest::Manifest;
pub use package::{DataPackage, build};
pub use write::write;

// Re-export core types for convenience
pub use tabula_core::{
    BusTable, ElementTable, FacadeSchema, ForeignKey, PeriodRow, PeriodTable, ProcessData,
    Reference, SequenceTable, Timeseries, TsaParameters, schema,
};
pub use tabula_types::{
    AdapterError, AdapterSettings, BusGroup, BusMap, CalculationMode, ClusterMethod,
    DEFAULT_SCOPE, Diagnostic, DiagnosticKind, MappingConfig, ParameterMap, Representation, Row,
    Severity, Structure, TsamConfig, Value,
};
