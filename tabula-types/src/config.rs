//! Configuration types shared by the resolution core and the orchestrator.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::mapping::{BusMap, ParameterMap};
use crate::structure::Structure;

/// How failures of derived-field calculations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CalculationMode {
    /// Propagate the failure; the affected process is aborted.
    #[default]
    Strict,
    /// Null the derived field and record a diagnostic.
    Lenient,
}

/// Clustering algorithm used to pick typical periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ClusterMethod {
    /// Agglomerative clustering with Ward linkage.
    #[default]
    Hierarchical,
    /// Seeded k-means.
    KMeans,
    /// Partitioning around medoids.
    KMedoids,
}

/// How a cluster is represented by its typical period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Representation {
    /// The member period closest to the cluster mean.
    #[default]
    Medoid,
    /// The step-wise mean of all member periods.
    Mean,
}

/// Typical-period aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsamConfig {
    /// Number of typical periods kept per modelled period.
    pub typical_periods: usize,
    /// Length of one candidate period in hours.
    pub hours_per_period: usize,
    /// Whether steps within a typical period are merged into segments.
    pub segmentation: bool,
    /// Segment count per typical period when `segmentation` is on.
    pub segments: usize,
    /// Cluster representation.
    pub representation: Representation,
    /// Cluster algorithm.
    pub cluster_method: ClusterMethod,
    /// Seed for randomized cluster initialisation.
    pub seed: u64,
}

impl Default for TsamConfig {
    fn default() -> Self {
        Self {
            typical_periods: 10,
            hours_per_period: 24,
            segmentation: false,
            segments: 12,
            representation: Representation::Medoid,
            cluster_method: ClusterMethod::Hierarchical,
            seed: 42,
        }
    }
}

/// Global run settings for the adapter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Derived-field failure policy.
    pub calculation_mode: CalculationMode,
    /// Seed for missing-value imputation during periodic aggregation.
    pub seed: u64,
    /// Abort the whole run when any process fails.
    pub fail_fast: bool,
    /// Fan processes out over a worker pool.
    pub parallel: bool,
    /// Optional typical-period aggregation of the sequences.
    pub tsam: Option<TsamConfig>,
    /// Name written into the datapackage manifest.
    pub package_name: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            calculation_mode: CalculationMode::Strict,
            seed: 42,
            fail_fast: false,
            parallel: true,
            tsam: None,
            package_name: "datapackage".to_string(),
        }
    }
}

/// Run configuration: how source fields, busses and processes map onto the
/// downstream schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// `{scope -> {logical_field -> source_field}}`.
    pub parameter_map: ParameterMap,
    /// `{type -> {bus_role -> physical_bus}}`.
    pub bus_map: BusMap,
    /// `{process -> adapter name}`.
    pub process_adapter_map: IndexMap<String, String>,
    /// `{process -> structure}`.
    pub structures: IndexMap<String, Structure>,
}

impl MappingConfig {
    /// Parse a mapping configuration from JSON text.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` if the text is not a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self, AdapterError> {
        serde_json::from_str(text).map_err(|e| AdapterError::Config(e.to_string()))
    }

    /// Read and parse a mapping configuration from a JSON file.
    ///
    /// # Errors
    /// Returns `AdapterError::Io` if the file cannot be read and
    /// `AdapterError::Config` if it does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Adapter name configured for `process`.
    #[must_use]
    pub fn adapter_for(&self, process: &str) -> Option<&str> {
        self.process_adapter_map.get(process).map(String::as_str)
    }
}
