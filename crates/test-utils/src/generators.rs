//! Test data generators for creating synthetic ensemble forecasts.
//!
//! These generators create predictable, verifiable datasets that use the
//! default [`EnsembleSchema`] names and the dimension order of the seasonal
//! product: `(number, forecast_reference_time, latitude, longitude)`.

use forecast_common::{Dataset, EnsembleSchema, Field};
use ndarray::{ArrayD, IxDyn};

/// Builds ensemble datasets cell by cell.
///
/// # Example
///
/// ```
/// use test_utils::EnsembleBuilder;
///
/// let ds = EnsembleBuilder::new(3, 1, 2, 2)
///     .build(|member, _time, _row, _col| (260.0 + member as f32, 0.5));
/// assert_eq!(ds.variables.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EnsembleBuilder {
    pub members: usize,
    pub times: usize,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub schema: EnsembleSchema,
}

impl EnsembleBuilder {
    /// Create a builder with descending latitudes and ascending longitudes
    /// at 1 degree spacing, anchored at 37N 69E.
    pub fn new(members: usize, times: usize, height: usize, width: usize) -> Self {
        Self {
            members,
            times,
            lats: (0..height).map(|i| 37.0 - i as f64).collect(),
            lons: (0..width).map(|i| 69.0 + i as f64).collect(),
            schema: EnsembleSchema::default(),
        }
    }

    /// Override the latitude coordinates.
    pub fn with_lats(mut self, lats: Vec<f64>) -> Self {
        self.lats = lats;
        self
    }

    /// Shape in dimension order.
    pub fn shape(&self) -> [usize; 4] {
        [self.members, self.times, self.lats.len(), self.lons.len()]
    }

    /// Dimension names in order.
    pub fn dims(&self) -> Vec<String> {
        vec![
            self.schema.member_dim.clone(),
            self.schema.time_dim.clone(),
            self.schema.lat_dim.clone(),
            self.schema.lon_dim.clone(),
        ]
    }

    /// Build a dataset; `cell` returns `(temperature_k, precipitation_rate)`.
    pub fn build<F>(&self, cell: F) -> Dataset
    where
        F: Fn(usize, usize, usize, usize) -> (f32, f32),
    {
        let shape = self.shape();
        let n: usize = shape.iter().product();
        let mut temps = Vec::with_capacity(n);
        let mut precips = Vec::with_capacity(n);

        for m in 0..shape[0] {
            for t in 0..shape[1] {
                for row in 0..shape[2] {
                    for col in 0..shape[3] {
                        let (temp, precip) = cell(m, t, row, col);
                        temps.push(temp);
                        precips.push(precip);
                    }
                }
            }
        }

        let to_array = |values: Vec<f32>| {
            ArrayD::from_shape_vec(IxDyn(&shape), values).expect("shape matches generated data")
        };

        let temperature = Field::new(&self.schema.temperature, self.dims(), to_array(temps))
            .expect("dims match shape")
            .with_units("K");
        let precipitation = Field::new(
            &self.schema.precipitation_rate,
            self.dims(),
            to_array(precips),
        )
        .expect("dims match shape")
        .with_units("m s**-1");

        Dataset::new()
            .with_field(temperature)
            .with_field(precipitation)
            .with_coord(
                self.schema.member_dim.clone(),
                (0..self.members).map(|m| m as f64).collect(),
            )
            .with_coord(
                self.schema.time_dim.clone(),
                (0..self.times).map(|t| t as f64 * 24.0).collect(),
            )
            .with_coord(self.schema.lat_dim.clone(), self.lats.clone())
            .with_coord(self.schema.lon_dim.clone(), self.lons.clone())
    }
}

/// A single-point ensemble (1 time, 1x1 grid) from per-member values.
pub fn single_point_ensemble(temps: &[f32], precips: &[f32]) -> Dataset {
    assert_eq!(temps.len(), precips.len(), "one precipitation value per member");
    EnsembleBuilder::new(temps.len(), 1, 1, 1).build(|m, _, _, _| (temps[m], precips[m]))
}

/// An ensemble where every cell has the same temperature and precipitation.
pub fn uniform_ensemble(
    members: usize,
    height: usize,
    width: usize,
    temperature: f32,
    precipitation: f32,
) -> Dataset {
    EnsembleBuilder::new(members, 1, height, width).build(|_, _, _, _| (temperature, precipitation))
}

/// A realistic-looking ensemble: colder to the north, patchy precipitation
/// varying per member.
pub fn create_winter_ensemble(
    members: usize,
    times: usize,
    height: usize,
    width: usize,
    seed: u32,
) -> Dataset {
    EnsembleBuilder::new(members, times, height, width).build(|m, t, row, col| {
        let temp = create_temperature_value(row, col, height, width) + (m % 5) as f32 - 2.0;
        let hash = simple_hash(col as u32, row as u32, seed ^ (m as u32 * 7919 + t as u32));
        // Most values are 0 (no precip), some up to 5e-8 m/s
        let precip = if hash % 3 == 0 {
            (hash % 5000) as f32 * 1.0e-11
        } else {
            0.0
        };
        (temp, precip)
    })
}

/// Temperature in Kelvin for a grid cell, from ~255K (north-west) to ~285K
/// (south-east).
fn create_temperature_value(row: usize, col: usize, height: usize, width: usize) -> f32 {
    let x_factor = col as f32 / width.max(1) as f32;
    let y_factor = row as f32 / height.max(1) as f32;
    255.0 + (x_factor * 10.0) + (y_factor * 20.0)
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_layout() {
        let ds = EnsembleBuilder::new(2, 3, 4, 5).build(|m, t, row, col| {
            ((m * 1000 + t * 100 + row * 10 + col) as f32, 0.0)
        });
        let t2m = ds.require("t2m").unwrap();
        assert_eq!(t2m.shape(), &[2, 3, 4, 5]);
        assert_eq!(t2m.data[[1, 2, 3, 4]], 1234.0);
        assert_eq!(ds.coord("latitude").unwrap(), &[37.0, 36.0, 35.0, 34.0]);
    }

    #[test]
    fn test_winter_ensemble_is_deterministic() {
        let a = create_winter_ensemble(5, 1, 6, 6, 42);
        let b = create_winter_ensemble(5, 1, 6, 6, 42);
        assert_eq!(a.require("tprate").unwrap(), b.require("tprate").unwrap());
    }
}
