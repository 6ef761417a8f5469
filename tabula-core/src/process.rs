//! Source data of one process.

use tabula_types::Row;

use crate::tables::SequenceTable;

/// Timeseries attached to a process.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Timeseries {
    /// No timeseries.
    #[default]
    None,
    /// Tall rows with `region`, `timeindex_start`, `timeindex_stop`,
    /// `timeindex_resolution` and array-valued columns.
    Tall(Vec<Row>),
    /// Already wide.
    Wide(SequenceTable),
}

/// Scalar rows and timeseries of one process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessData {
    /// One row per region/technology/year.
    pub scalars: Vec<Row>,
    /// Attached timeseries.
    pub timeseries: Timeseries,
}

impl ProcessData {
    /// Process with scalar rows only.
    #[must_use]
    pub fn new(scalars: Vec<Row>) -> Self {
        Self {
            scalars,
            timeseries: Timeseries::None,
        }
    }

    /// Attach timeseries.
    #[must_use]
    pub fn with_timeseries(mut self, timeseries: Timeseries) -> Self {
        self.timeseries = timeseries;
        self
    }
}
