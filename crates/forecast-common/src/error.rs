//! Error types shared by the loader, deriver, presenter and dashboard.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ForecastError.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Primary error type for forecast loading, derivation and rendering.
///
/// Every variant is recoverable: the dashboard reports it next to the
/// affected tab or panel and keeps serving other views.
#[derive(Debug, Error)]
pub enum ForecastError {
    // === Input Errors ===
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unable to read {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing required dimension: {0}")]
    MissingDimension(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("File declares no data variables: {}", .0.display())]
    NoDataVariables(PathBuf),

    // === Selection Errors ===
    #[error("Index {index} out of range for '{axis}' (length {len})")]
    IndexOutOfRange {
        axis: String,
        index: usize,
        len: usize,
    },

    #[error("Day {0} is outside the selectable range 1-31")]
    DayOutOfRange(u32),

    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Unknown forecast month: {0}")]
    UnknownMonth(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ForecastError {
    /// Create an Unreadable error.
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(axis: impl Into<String>, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange {
            axis: axis.into(),
            index,
            len,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            ForecastError::FileNotFound(_)
            | ForecastError::InvalidDate(_)
            | ForecastError::UnknownMonth(_) => 404,

            ForecastError::DayOutOfRange(_) | ForecastError::IndexOutOfRange { .. } => 400,

            ForecastError::MissingField(_)
            | ForecastError::MissingDimension(_)
            | ForecastError::ShapeMismatch(_)
            | ForecastError::NoDataVariables(_)
            | ForecastError::Unreadable { .. } => 422,

            ForecastError::RenderError(_) | ForecastError::InternalError(_) => 500,
        }
    }

    /// Whether the error means "this view has no data yet" rather than a fault.
    pub fn is_not_available(&self) -> bool {
        matches!(
            self,
            ForecastError::FileNotFound(_)
                | ForecastError::IndexOutOfRange { .. }
                | ForecastError::DayOutOfRange(_)
                | ForecastError::InvalidDate(_)
        )
    }

    /// Message suitable for showing inline in the dashboard.
    ///
    /// `subject` names the view, e.g. "December 2025" or "December 5".
    pub fn user_message(&self, subject: &str) -> String {
        if self.is_not_available() {
            format!("Forecast data for {} is not available yet.", subject)
        } else {
            format!("Error loading {}: {}", subject, self)
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::InternalError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForecastError::ShapeMismatch(err.to_string())
    }
}
