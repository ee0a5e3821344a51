//! Variable and dimension names expected in ensemble forecast files.

use serde::{Deserialize, Serialize};

/// Names of the variables and dimensions an ensemble file must expose.
///
/// Defaults follow the ECMWF seasonal monthly-mean product as downloaded
/// from the Copernicus Climate Data Store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSchema {
    /// 2 m temperature variable (Kelvin)
    pub temperature: String,
    /// Total precipitation rate variable
    pub precipitation_rate: String,
    /// Ensemble member dimension
    pub member_dim: String,
    /// Forecast reference time dimension
    pub time_dim: String,
    /// Latitude dimension
    pub lat_dim: String,
    /// Longitude dimension
    pub lon_dim: String,
}

impl Default for EnsembleSchema {
    fn default() -> Self {
        Self {
            temperature: "t2m".to_string(),
            precipitation_rate: "tprate".to_string(),
            member_dim: "number".to_string(),
            time_dim: "forecast_reference_time".to_string(),
            lat_dim: "latitude".to_string(),
            lon_dim: "longitude".to_string(),
        }
    }
}

impl EnsembleSchema {
    /// Variables that must be read from an ensemble file.
    pub fn required_fields(&self) -> [&str; 2] {
        [&self.temperature, &self.precipitation_rate]
    }
}
