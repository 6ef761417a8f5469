//! Tabula-specific value types and configuration primitives shared by the
//! resolution core and the datapackage orchestrator.
#![warn(missing_docs)]

mod config;
mod diagnostic;
mod error;
/// Scoped parameter and bus mappings.
pub mod mapping;
mod structure;
mod value;

pub use config::{
    AdapterSettings, CalculationMode, ClusterMethod, MappingConfig, Representation, TsamConfig,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::AdapterError;
pub use mapping::{BusMap, DEFAULT_SCOPE, MappingContext, ParameterMap, ScopeKey, ScopedMap};
pub use structure::{BusGroup, GroupSelection, Structure};
pub use value::{Row, Value};
