//! tabula-core
//!
//! Resolution and aggregation algorithms turning per-technology source rows
//! into canonical component records.
//!
//! - `schema`: versioned field schemas of the downstream component types.
//! - `resolve`: logical-to-physical key lookup and bus role resolution.
//! - `builder`: component records from source rows, with derived fields.
//! - `calculations`: annuity, decommissioning and lifetime flooring.
//! - `periodic`: multi-year aggregation with seeded imputation.
//! - `foreign_keys`: links from element columns to bus and sequence tables.
//! - `tables`: sequence, period, bus and element tables.
//! - `timeseries`: reshaping, step inference and typical-period aggregation.
//!
//! Nothing in this crate performs I/O.
#![warn(missing_docs)]

/// Component record construction.
pub mod builder;
/// Derived-field calculations.
pub mod calculations;
/// Foreign key derivation.
pub mod foreign_keys;
/// Multi-year aggregation.
pub mod periodic;
/// Source data of a process.
pub mod process;
/// Key and bus resolution.
pub mod resolve;
pub mod schema;
/// Output tables.
pub mod tables;
/// Timeseries utilities.
pub mod timeseries;

pub use builder::{ComponentBuilder, NAME_SEPARATOR, NameCounter};
pub use calculations::{annuity, capacity_cost, decommission, floor_lifetime};
pub use foreign_keys::{ForeignKey, Reference, sequence_resource};
pub use periodic::{PeriodicAggregator, pad_mixed_columns};
pub use process::{ProcessData, Timeseries};
pub use resolve::busses::{BusResolver, ResolvedBusses};
pub use resolve::keys::{KeyResolver, Lookup};
pub use schema::{FacadeSchema, FieldDefault, FieldKind, FieldSpec};
pub use tables::{BusTable, ElementTable, PeriodRow, PeriodTable, SequenceTable};
pub use timeseries::infer::estimate_step_seconds;
pub use timeseries::reshape::{parse_resolution, parse_timestamp, reshape, to_tall};
pub use timeseries::tsam::{AggregatedSequences, TsaParameters, aggregate_periods};
