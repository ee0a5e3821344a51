//! In-memory datasets: named n-dimensional fields plus their coordinates.
//!
//! A [`Dataset`] is what a loader hands to the deriver. It is immutable once
//! built and carries no file handle; the file is closed before the dataset
//! is returned.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};
use crate::grid::GeoGrid;

/// Coordinate vectors keyed by dimension name.
pub type Coordinates = BTreeMap<String, Vec<f64>>;

/// A named n-dimensional array with ordered dimension names.
///
/// Missing values are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<f32>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

impl Field {
    /// Create a field, checking that every array axis has a dimension name.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        data: ArrayD<f32>,
    ) -> ForecastResult<Self> {
        let name = name.into();
        if dims.len() != data.ndim() {
            return Err(ForecastError::ShapeMismatch(format!(
                "field '{}' has {} dimension names for a {}-d array",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            name,
            dims,
            data,
            units: None,
            long_name: None,
        })
    }

    /// Attach a units string.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Position of a named dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Select one index along a dimension, dropping that dimension.
    pub fn select(&self, dim: &str, index: usize) -> ForecastResult<Field> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| ForecastError::MissingDimension(dim.to_string()))?;
        let len = self.data.len_of(Axis(axis));
        if index >= len {
            return Err(ForecastError::index_out_of_range(dim, index, len));
        }

        let mut dims = self.dims.clone();
        dims.remove(axis);

        Ok(Field {
            name: self.name.clone(),
            dims,
            data: self.data.index_axis(Axis(axis), index).to_owned(),
            units: self.units.clone(),
            long_name: self.long_name.clone(),
        })
    }

    /// Drop every length-1 dimension that is not listed in `keep`.
    pub fn squeeze_except(&self, keep: &[&str]) -> Field {
        let mut field = self.clone();
        let mut axis = 0;
        while axis < field.dims.len() {
            let squeezable =
                field.data.len_of(Axis(axis)) == 1 && !keep.contains(&field.dims[axis].as_str());
            if squeezable {
                field.data = field.data.index_axis_move(Axis(axis), 0);
                field.dims.remove(axis);
            } else {
                axis += 1;
            }
        }
        field
    }

    /// Reduce to a latitude × longitude grid.
    ///
    /// Length-1 dimensions are squeezed; any other extra dimension is an
    /// error. A `[lon, lat]` layout is transposed to `[lat, lon]`.
    pub fn to_geo_grid(
        &self,
        coords: &Coordinates,
        lat_dim: &str,
        lon_dim: &str,
    ) -> ForecastResult<GeoGrid> {
        let field = self.squeeze_except(&[lat_dim, lon_dim]);

        let lat_axis = field
            .axis_of(lat_dim)
            .ok_or_else(|| ForecastError::MissingDimension(lat_dim.to_string()))?;
        let lon_axis = field
            .axis_of(lon_dim)
            .ok_or_else(|| ForecastError::MissingDimension(lon_dim.to_string()))?;

        if field.dims.len() != 2 {
            return Err(ForecastError::ShapeMismatch(format!(
                "field '{}' must reduce to ({}, {}) but has dimensions {:?}",
                field.name, lat_dim, lon_dim, field.dims
            )));
        }

        let values = field.data.into_dimensionality::<ndarray::Ix2>()?;
        let values = if lat_axis < lon_axis {
            values
        } else {
            values.reversed_axes().as_standard_layout().to_owned()
        };

        let lats = coordinate_or_index(coords, lat_dim, values.nrows());
        let lons = coordinate_or_index(coords, lon_dim, values.ncols());

        GeoGrid::new(values, lats, lons)
    }
}

/// Coordinate values for a dimension, or `0..len` when none were recorded.
pub fn coordinate_or_index(coords: &Coordinates, dim: &str, len: usize) -> Vec<f64> {
    match coords.get(dim) {
        Some(values) if values.len() == len => values.clone(),
        _ => (0..len).map(|i| i as f64).collect(),
    }
}

/// A set of data variables sharing coordinates, as read from one file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Source file, when loaded from disk
    pub path: Option<PathBuf>,
    /// Data variables in declaration order
    pub variables: Vec<Field>,
    /// Coordinate vectors keyed by dimension name
    pub coords: Coordinates,
    /// Global attributes, rendered as strings
    pub attributes: Vec<(String, String)>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data variable.
    pub fn with_field(mut self, field: Field) -> Self {
        self.variables.push(field);
        self
    }

    /// Add a coordinate vector.
    pub fn with_coord(mut self, dim: impl Into<String>, values: Vec<f64>) -> Self {
        self.coords.insert(dim.into(), values);
        self
    }

    /// Look up a data variable by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.variables.iter().find(|f| f.name == name)
    }

    /// Look up a data variable, failing with `MissingField`.
    pub fn require(&self, name: &str) -> ForecastResult<&Field> {
        self.field(name)
            .ok_or_else(|| ForecastError::MissingField(name.to_string()))
    }

    /// Coordinate vector for a dimension.
    pub fn coord(&self, dim: &str) -> Option<&[f64]> {
        self.coords.get(dim).map(Vec::as_slice)
    }
}

/// Ensemble-reduced fields for one forecast month.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    /// Mean precipitation rate over members below freezing (NaN where none)
    pub mean_snowfall: Field,
    /// Percentage of members producing snow, 0-100
    pub probability_of_snow: Field,
    /// Coordinates carried over from the ensemble dataset
    pub coords: Coordinates,
    /// Size of the collapsed ensemble dimension
    pub members: usize,
}

/// A single-day field with no ensemble dimension.
#[derive(Debug, Clone)]
pub struct DailyField {
    pub field: Field,
    pub coords: Coordinates,
}

impl DailyField {
    /// Variable name of the underlying field.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Latitude × longitude view of the field.
    pub fn to_geo_grid(&self, lat_dim: &str, lon_dim: &str) -> ForecastResult<GeoGrid> {
        self.field.to_geo_grid(&self.coords, lat_dim, lon_dim)
    }
}

/// Structural description of a file, shown in the raw-data expander.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub path: String,
    pub dimensions: Vec<DimensionSummary>,
    pub variables: Vec<VariableSummary>,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub name: String,
    pub len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSummary {
    pub name: String,
    pub dims: Vec<String>,
    pub units: Option<String>,
    pub is_coordinate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sequential(shape: &[usize]) -> ArrayD<f32> {
        let n: usize = shape.iter().product();
        ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_field_rejects_dimension_count_mismatch() {
        let result = Field::new("t2m", dims(&["latitude"]), sequential(&[2, 3]));
        assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
    }

    #[test]
    fn test_select_drops_dimension() {
        let field = Field::new(
            "x",
            dims(&["time", "latitude", "longitude"]),
            sequential(&[2, 3, 4]),
        )
        .unwrap();
        let slice = field.select("time", 1).unwrap();
        assert_eq!(slice.dims, dims(&["latitude", "longitude"]));
        assert_eq!(slice.shape(), &[3, 4]);
        assert_eq!(slice.data[[0, 0]], 12.0);
    }

    #[test]
    fn test_select_out_of_range() {
        let field = Field::new("x", dims(&["time", "latitude"]), sequential(&[2, 3])).unwrap();
        let err = field.select("time", 2).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::IndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn test_squeeze_keeps_requested_axes() {
        let field = Field::new(
            "x",
            dims(&["month", "latitude", "longitude"]),
            sequential(&[1, 1, 4]),
        )
        .unwrap();
        let squeezed = field.squeeze_except(&["latitude", "longitude"]);
        assert_eq!(squeezed.dims, dims(&["latitude", "longitude"]));
        assert_eq!(squeezed.shape(), &[1, 4]);
    }

    #[test]
    fn test_to_geo_grid_transposes_lon_lat() {
        let field = Field::new("x", dims(&["longitude", "latitude"]), sequential(&[3, 2])).unwrap();
        let coords = Coordinates::new();
        let grid = field.to_geo_grid(&coords, "latitude", "longitude").unwrap();
        assert_eq!(grid.values.dim(), (2, 3));
        // (lon=2, lat=1) was flat index 5
        assert_eq!(grid.values[[1, 2]], 5.0);
        assert_eq!(grid.lons, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_to_geo_grid_rejects_extra_dimension() {
        let field = Field::new(
            "x",
            dims(&["member", "latitude", "longitude"]),
            sequential(&[2, 2, 2]),
        )
        .unwrap();
        let err = field
            .to_geo_grid(&Coordinates::new(), "latitude", "longitude")
            .unwrap_err();
        assert!(matches!(err, ForecastError::ShapeMismatch(_)));
    }

    #[test]
    fn test_dataset_require_missing() {
        let ds = Dataset::new();
        assert!(matches!(
            ds.require("tprate"),
            Err(ForecastError::MissingField(name)) if name == "tprate"
        ));
    }
}
