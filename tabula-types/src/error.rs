use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tabula workspace.
///
/// This wraps bus mapping failures, derived-field calculation failures,
/// configuration and data problems, I/O, and an aggregate for runs in which
/// every process failed.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdapterError {
    /// A bus role could not be resolved to exactly one physical bus.
    #[error("mapping failed for {process}: {msg}")]
    Mapping {
        /// Process whose structure could not be mapped.
        process: String,
        /// Human-readable reason.
        msg: String,
    },

    /// A derived-field calculation failed.
    #[error("calculation '{function}' called with ({inputs}) failed: {reason}")]
    Calculation {
        /// Name of the calculation, e.g. "annuity".
        function: String,
        /// Rendered inputs the calculation was called with.
        inputs: String,
        /// Underlying failure.
        reason: String,
    },

    /// Invalid or incomplete run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Issues with the input data (malformed timestamps, non-numeric arrays, ...).
    #[error("data issue: {0}")]
    Data(String),

    /// Filesystem failure while persisting or loading.
    #[error("io error: {0}")]
    Io(String),

    /// Encoding failure while writing tables or the manifest.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A single process failed; wraps the originating error.
    #[error("process {process} failed: {error}")]
    ProcessFailed {
        /// Process name.
        process: String,
        /// The failure that aborted the process.
        #[source]
        error: Box<AdapterError>,
    },

    /// Every configured process failed; contains the individual failures.
    #[error("all processes failed: {0:?}")]
    AllProcessesFailed(Vec<AdapterError>),
}

impl AdapterError {
    /// Helper: build a `Mapping` error for a process.
    pub fn mapping(process: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Mapping {
            process: process.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Calculation` error.
    pub fn calculation(
        function: impl Into<String>,
        inputs: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Calculation {
            function: function.into(),
            inputs: inputs.into(),
            reason: reason.into(),
        }
    }

    /// Helper: tag an error with the process it aborted.
    pub fn process_failed(process: impl Into<String>, error: Self) -> Self {
        Self::ProcessFailed {
            process: process.into(),
            error: Box::new(error),
        }
    }

    /// True for derived-field calculation failures.
    #[must_use]
    pub const fn is_calculation(&self) -> bool {
        matches!(self, Self::Calculation { .. })
    }

    /// True for bus mapping failures.
    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
