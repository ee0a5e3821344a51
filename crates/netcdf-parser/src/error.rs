//! Error types for NetCDF loading operations.

use std::path::PathBuf;

use forecast_common::ForecastError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF loading.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// The file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but the NetCDF library could not open it
    #[error("Failed to open {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    /// Missing required variable or dimension
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// The file has only coordinate variables
    #[error("No data variables in {}", .0.display())]
    NoDataVariables(PathBuf),

    /// Shape assembly error
    #[error("Invalid shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl From<NetCdfError> for ForecastError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::NotFound(path) => ForecastError::FileNotFound(path),
            NetCdfError::Open { path, message } => ForecastError::Unreadable { path, message },
            NetCdfError::MissingData(name) => ForecastError::MissingField(name),
            NetCdfError::InvalidFormat(message) => ForecastError::ShapeMismatch(message),
            NetCdfError::NoDataVariables(path) => ForecastError::NoDataVariables(path),
            NetCdfError::Shape(e) => ForecastError::ShapeMismatch(e.to_string()),
        }
    }
}
