//! Regular latitude/longitude grids ready for painting.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A 2-D field with rows along latitude and columns along longitude.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    pub values: Array2<f32>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl GeoGrid {
    /// Create a grid, checking coordinate lengths against the array shape.
    pub fn new(values: Array2<f32>, lats: Vec<f64>, lons: Vec<f64>) -> ForecastResult<Self> {
        let (rows, cols) = values.dim();
        if lats.len() != rows || lons.len() != cols {
            return Err(ForecastError::ShapeMismatch(format!(
                "grid is {}x{} but has {} latitudes and {} longitudes",
                rows,
                cols,
                lats.len(),
                lons.len()
            )));
        }
        Ok(Self { values, lats, lons })
    }

    /// Number of columns (longitude points).
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Number of rows (latitude points).
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bounding box spanned by the coordinates.
    pub fn bbox(&self) -> BoundingBox {
        let (min_x, max_x) = extent(&self.lons);
        let (min_y, max_y) = extent(&self.lats);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Reorder rows so the first row is the northernmost.
    ///
    /// Seasonal products usually store latitude descending already; files
    /// with ascending latitude are flipped.
    pub fn north_up(mut self) -> Self {
        let ascending = self.lats.len() > 1 && self.lats[0] < self.lats[self.lats.len() - 1];
        if ascending {
            self.values.invert_axis(Axis(0));
            self.values = self.values.as_standard_layout().to_owned();
            self.lats.reverse();
        }
        self
    }

    /// Minimum and maximum of the finite values, if any.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Row-major copy of the values.
    pub fn to_row_major(&self) -> Vec<f32> {
        self.values.iter().copied().collect()
    }
}

fn extent(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_north_up_flips_ascending_latitudes() {
        let grid = GeoGrid::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            vec![10.0, 20.0],
            vec![0.0, 1.0],
        )
        .unwrap()
        .north_up();

        assert_eq!(grid.lats, vec![20.0, 10.0]);
        assert_eq!(grid.to_row_major(), vec![3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_north_up_keeps_descending_latitudes() {
        let grid = GeoGrid::new(array![[1.0], [2.0]], vec![20.0, 10.0], vec![0.0])
            .unwrap()
            .north_up();
        assert_eq!(grid.to_row_major(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_value_range_ignores_nan() {
        let grid = GeoGrid::new(
            array![[f32::NAN, 2.0], [-1.0, 4.0]],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        )
        .unwrap();
        assert_eq!(grid.value_range(), Some((-1.0, 4.0)));
    }

    #[test]
    fn test_value_range_all_missing() {
        let grid = GeoGrid::new(array![[f32::NAN]], vec![0.0], vec![0.0]).unwrap();
        assert_eq!(grid.value_range(), None);
    }

    #[test]
    fn test_bbox() {
        let grid = GeoGrid::new(
            array![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            vec![47.0, 46.0],
            vec![-10.0, -9.0, -8.0],
        )
        .unwrap();
        let bbox = grid.bbox();
        assert_eq!(bbox, BoundingBox::new(-10.0, 46.0, -8.0, 47.0));
        assert_eq!(bbox.width(), 2.0);
    }

    #[test]
    fn test_new_rejects_coordinate_mismatch() {
        let result = GeoGrid::new(array![[0.0, 0.0]], vec![0.0], vec![0.0]);
        assert!(result.is_err());
    }
}
