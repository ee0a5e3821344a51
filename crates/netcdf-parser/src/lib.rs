//! NetCDF reader for ensemble seasonal forecasts and daily snowfall files.
//!
//! This crate turns NetCDF-4 files into in-memory [`forecast_common::Dataset`]s
//! and [`forecast_common::DailyField`]s. Every entry point opens the file,
//! reads what it needs and closes it again before returning.
//!
//! # Ensemble File Structure
//!
//! Monthly files follow the ECMWF seasonal product layout: variables `t2m`
//! (Kelvin) and `tprate` over `(number, forecast_reference_time, latitude,
//! longitude)`, where `number` is the ensemble member. Names are configurable
//! through [`forecast_common::EnsembleSchema`].

pub mod daily;
pub mod ensemble;
pub mod error;
pub mod native;

pub use daily::{describe, open_daily};
pub use ensemble::open_ensemble;
pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
