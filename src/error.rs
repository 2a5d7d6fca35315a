use crate::forecast::forest::ForestError;
use crate::grid::error::DataFormatError;
use crate::types::request::InputValidationError;
use crate::types::variable::Variable;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the pipeline can surface. Partial results are never returned
/// alongside an error.
#[derive(Debug, Error)]
pub enum GridcastError {
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),

    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    #[error("Daily series for {variable} has {found} days but the historical axis has {expected}")]
    Alignment {
        variable: Variable,
        expected: usize,
        found: usize,
    },

    #[error("Not enough history to train: {rows} rows cannot cover a look-back of {lookback} plus a horizon of {horizon} days")]
    InsufficientHistory {
        rows: usize,
        lookback: usize,
        horizon: usize,
    },

    #[error("Forecast model failed")]
    Model(#[from] ForestError),

    #[error("Failed to read gridded file '{file}'")]
    ExternalIo {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to encode forecast result as JSON")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write forecast result to '{0}'")]
    ResultWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to access historical frame file '{0}'")]
    FrameFile(PathBuf, #[source] std::io::Error),
}

impl GridcastError {
    /// Whether the caller can fix the request itself (bad input or too long a range)
    /// rather than the data or the environment being at fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GridcastError::InputValidation(_) | GridcastError::InsufficientHistory { .. }
        )
    }
}
