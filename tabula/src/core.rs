use std::path::Path;

use indexmap::IndexMap;
use tabula_core::ProcessData;
use tabula_types::{
    AdapterError, AdapterSettings, BusMap, CalculationMode, MappingConfig, ParameterMap, Structure,
    TsamConfig,
};

use crate::package::{self, DataPackage};

/// Run configuration plus the source data of every process.
#[derive(Debug, Clone)]
pub struct Adapter {
    pub(crate) config: MappingConfig,
    pub(crate) settings: AdapterSettings,
    pub(crate) processes: IndexMap<String, ProcessData>,
}

/// Builder for constructing an [`Adapter`] with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct AdapterBuilder {
    config: MappingConfig,
    settings: AdapterSettings,
    processes: IndexMap<String, ProcessData>,
}

impl AdapterBuilder {
    /// Create a new builder with default settings and no processes.
    ///
    /// Defaults: strict calculations, imputation seed 42, processes run in
    /// parallel, a failing process is skipped rather than failing the run,
    /// no typical-period aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole mapping configuration.
    ///
    /// Processes registered through [`process`](Self::process) afterwards
    /// are added on top of it.
    #[must_use]
    pub fn mapping(mut self, config: MappingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the parameter map.
    #[must_use]
    pub fn parameter_map(mut self, map: ParameterMap) -> Self {
        self.config.parameter_map = map;
        self
    }

    /// Set the bus map.
    #[must_use]
    pub fn bus_map(mut self, map: BusMap) -> Self {
        self.config.bus_map = map;
        self
    }

    /// Register a process with its adapter, structure and source data.
    ///
    /// Registering the same name twice replaces the earlier entry.
    #[must_use]
    pub fn process(
        mut self,
        name: impl Into<String>,
        adapter: impl Into<String>,
        structure: Structure,
        data: ProcessData,
    ) -> Self {
        let name = name.into();
        self.config
            .process_adapter_map
            .insert(name.clone(), adapter.into());
        self.config.structures.insert(name.clone(), structure);
        self.processes.insert(name, data);
        self
    }

    /// Attach source data to a process already described by the mapping
    /// configuration.
    #[must_use]
    pub fn process_data(mut self, name: impl Into<String>, data: ProcessData) -> Self {
        self.processes.insert(name.into(), data);
        self
    }

    /// Replace all run settings.
    #[must_use]
    pub fn settings(mut self, settings: AdapterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Select how failing derived-field calculations are handled.
    ///
    /// `Strict` aborts the affected process; `Lenient` nulls the field and
    /// records a diagnostic.
    #[must_use]
    pub const fn calculation_mode(mut self, mode: CalculationMode) -> Self {
        self.settings.calculation_mode = mode;
        self
    }

    /// Seed for missing-value imputation.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    /// Fail the whole run as soon as any process fails.
    #[must_use]
    pub const fn fail_fast(mut self, yes: bool) -> Self {
        self.settings.fail_fast = yes;
        self
    }

    /// Run processes on the rayon pool instead of sequentially.
    ///
    /// Results are merged in registration order either way.
    #[must_use]
    pub const fn parallel(mut self, yes: bool) -> Self {
        self.settings.parallel = yes;
        self
    }

    /// Enable typical-period aggregation of the sequences.
    #[must_use]
    pub fn tsam(mut self, config: TsamConfig) -> Self {
        self.settings.tsam = Some(config);
        self
    }

    /// Name written into the datapackage manifest.
    #[must_use]
    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.settings.package_name = name.into();
        self
    }

    /// Build the `Adapter`.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` if no process data was registered or a
    /// process has no adapter assigned.
    pub fn build(self) -> Result<Adapter, AdapterError> {
        if self.processes.is_empty() {
            return Err(AdapterError::Config(
                "no processes registered; add at least one via process(...)".to_string(),
            ));
        }
        let unassigned: Vec<&str> = self
            .processes
            .keys()
            .filter(|p| self.config.adapter_for(p).is_none())
            .map(String::as_str)
            .collect();
        if !unassigned.is_empty() {
            return Err(AdapterError::Config(format!(
                "no adapter assigned to process(es): {}",
                unassigned.join(", ")
            )));
        }
        Ok(Adapter {
            config: self.config,
            settings: self.settings,
            processes: self.processes,
        })
    }
}

impl Adapter {
    /// Start building a new `Adapter`.
    ///
    /// ```rust,ignore
    /// use tabula::{Adapter, ProcessData, Structure};
    ///
    /// let adapter = Adapter::builder()
    ///     .process(
    ///         "wind",
    ///         "VolatileAdapter",
    ///         Structure::single(Vec::<String>::new(), ["electricity"]),
    ///         ProcessData::new(rows),
    ///     )
    ///     .seed(7)
    ///     .build()?;
    /// let package = adapter.build_package()?;
    /// package.write("out")?;
    /// ```
    #[must_use]
    pub fn builder() -> AdapterBuilder {
        AdapterBuilder::new()
    }

    /// The mapping configuration.
    #[must_use]
    pub const fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// The run settings.
    #[must_use]
    pub const fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Source data by process name, in registration order.
    #[must_use]
    pub const fn processes(&self) -> &IndexMap<String, ProcessData> {
        &self.processes
    }

    /// Run the pipeline; see [`package::build`].
    ///
    /// # Errors
    /// See [`package::build`].
    pub fn build_package(&self) -> Result<DataPackage, AdapterError> {
        package::build(self)
    }

    /// Run the pipeline and write the result below `destination`.
    ///
    /// # Errors
    /// Propagates pipeline and write failures.
    pub fn build_and_write(&self, destination: impl AsRef<Path>) -> Result<DataPackage, AdapterError> {
        let package = self.build_package()?;
        package.write(destination)?;
        Ok(package)
    }
}
