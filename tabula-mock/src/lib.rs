//! Deterministic fixture processes for tabula tests and examples.
//!
//! Processes:
//! - `wind_onshore`: volatile, BB over 2016/2030/2050 plus BE in 2030, tall timeseries
//! - `pv_utility`: volatile, wide timeseries
//! - `gas_chp`: extraction turbine with a bus map override for the heat bus
//! - `battery`: storage on a single bus
//! - `demand`: load with a single-column timeseries
//! - `transmission`: link between two electricity busses
//! - `broken_gt`: conversion with two fuel inputs, which fails bus resolution
use indexmap::IndexMap;
use tabula_core::{ProcessData, Timeseries};
use tabula_types::{MappingConfig, Structure};

mod fixtures {
    pub mod config;
    pub mod scalars;
    pub mod timeseries;
}

pub use fixtures::timeseries::{DAYS, YEARS};

/// Name of the fixture process that fails bus resolution.
pub const FAILING_PROCESS: &str = "broken_gt";

/// Mock source collection. Provides deterministic data from static fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCollection;

impl MockCollection {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Names of the processes that build cleanly.
    #[must_use]
    pub fn process_names(&self) -> Vec<&'static str> {
        fixtures::config::names()
            .filter(|n| *n != FAILING_PROCESS)
            .collect()
    }

    /// Source data of one fixture process, including [`FAILING_PROCESS`].
    #[must_use]
    pub fn process(&self, name: &str) -> Option<ProcessData> {
        let scalars = fixtures::scalars::by_process(name)?;
        let timeseries = fixtures::timeseries::by_process(name).unwrap_or(Timeseries::None);
        Some(ProcessData::new(scalars).with_timeseries(timeseries))
    }

    /// Source data of every process that builds cleanly.
    #[must_use]
    pub fn processes(&self) -> IndexMap<String, ProcessData> {
        self.process_names()
            .into_iter()
            .filter_map(|n| self.process(n).map(|d| (n.to_string(), d)))
            .collect()
    }

    /// Adapter assigned to a fixture process.
    #[must_use]
    pub fn adapter(&self, name: &str) -> Option<&'static str> {
        fixtures::config::adapter(name)
    }

    /// Bus structure of a fixture process.
    #[must_use]
    pub fn structure(&self, name: &str) -> Option<Structure> {
        fixtures::config::structure(name)
    }

    /// Mapping configuration covering every fixture process.
    #[must_use]
    pub fn mapping_config(&self) -> MappingConfig {
        fixtures::config::mapping_config()
    }
}
