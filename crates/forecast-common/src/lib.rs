//! Common types and utilities shared across the snowfall dashboard crates.

pub mod dataset;
pub mod error;
pub mod grid;
pub mod month;
pub mod schema;

pub use dataset::{
    Coordinates, DailyField, Dataset, DatasetSummary, DerivedFields, DimensionSummary, Field,
    VariableSummary,
};
pub use error::{ForecastError, ForecastResult};
pub use grid::{BoundingBox, GeoGrid};
pub use month::{DaySelection, ForecastMonth, MAX_DAY, MIN_DAY};
pub use schema::EnsembleSchema;
