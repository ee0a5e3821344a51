//! Snowfall derivation over the ensemble-member dimension.
//!
//! For every grid point the members are scanned in order:
//!
//! 1. a member is *eligible* when its temperature is strictly below freezing
//!    and its precipitation is not missing;
//! 2. `mean_snowfall` averages precipitation over eligible members only
//!    (excluded members do not enter the denominator);
//! 3. a member *produces snow* when it is eligible and its precipitation
//!    exceeds [`SNOW_EPSILON`];
//! 4. `probability_of_snow` is the share of snowing members, in percent.
//!
//! Sums are accumulated in `f64` in member order, so the result is
//! bit-identical across calls.

use std::time::Instant;

use forecast_common::{
    Coordinates, Dataset, DerivedFields, EnsembleSchema, Field, ForecastError, ForecastResult,
};
use ndarray::{ArrayD, ArrayView1, Axis, IxDyn, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Freezing point of water in Kelvin.
///
/// Temperatures are compared after the loader narrows them to `f32`, so a
/// stored value within `f32` rounding of 273.15 (for example the `f64`
/// 273.1499999) becomes exactly this constant and is not below freezing.
pub const FREEZING_POINT_K: f32 = 273.15;

/// Precipitation at or below this rate counts as no snow.
pub const SNOW_EPSILON: f32 = 1.0e-9;

/// Name of the derived mean field.
pub const MEAN_SNOWFALL: &str = "mean_snowfall";

/// Name of the derived probability field.
pub const PROBABILITY_OF_SNOW: &str = "probability_of_snow";

/// Denominator used for the probability of snow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityBasis {
    /// Share of the members that passed the temperature mask.
    /// A point with no eligible member has probability 0.
    #[default]
    EligibleMembers,
    /// Share of the whole ensemble; members above freezing count as no snow.
    AllMembers,
}

/// Tunable thresholds for the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveOptions {
    pub freezing_point_k: f32,
    pub snow_epsilon: f32,
    pub basis: ProbabilityBasis,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            freezing_point_k: FREEZING_POINT_K,
            snow_epsilon: SNOW_EPSILON,
            basis: ProbabilityBasis::default(),
        }
    }
}

/// Derives mean snowfall and probability of snow from ensemble datasets.
#[derive(Debug, Clone, Default)]
pub struct SnowDeriver {
    schema: EnsembleSchema,
    options: DeriveOptions,
}

impl SnowDeriver {
    pub fn new(schema: EnsembleSchema) -> Self {
        Self {
            schema,
            options: DeriveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DeriveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &EnsembleSchema {
        &self.schema
    }

    pub fn options(&self) -> &DeriveOptions {
        &self.options
    }

    /// Collapse the member dimension into the two derived fields.
    pub fn derive(&self, dataset: &Dataset) -> ForecastResult<DerivedFields> {
        let start = Instant::now();
        let temperature = dataset.require(&self.schema.temperature)?;
        let precipitation = dataset.require(&self.schema.precipitation_rate)?;
        let member_axis = self.validate(temperature, precipitation)?;
        let members = temperature.data.len_of(Axis(member_axis));

        let out_dims: Vec<String> = temperature
            .dims
            .iter()
            .filter(|d| **d != self.schema.member_dim)
            .cloned()
            .collect();
        let out_shape: Vec<usize> = temperature
            .shape()
            .iter()
            .enumerate()
            .filter(|(axis, _)| *axis != member_axis)
            .map(|(_, len)| *len)
            .collect();

        let mut mean = ArrayD::<f32>::zeros(IxDyn(&out_shape));
        let mut probability = ArrayD::<f32>::zeros(IxDyn(&out_shape));

        Zip::from(&mut mean)
            .and(&mut probability)
            .and(temperature.data.lanes(Axis(member_axis)))
            .and(precipitation.data.lanes(Axis(member_axis)))
            .for_each(|mean, probability, temps, precips| {
                let (m, p) = self.reduce_members(temps, precips);
                *mean = m;
                *probability = p;
            });

        let mut mean_snowfall = Field::new(MEAN_SNOWFALL, out_dims.clone(), mean)?;
        mean_snowfall.units = precipitation.units.clone();
        mean_snowfall.long_name = Some("Mean snowfall over members below freezing".to_string());

        let probability_of_snow =
            Field::new(PROBABILITY_OF_SNOW, out_dims, probability)?.with_units("%");

        let coords: Coordinates = dataset
            .coords
            .iter()
            .filter(|(dim, _)| **dim != self.schema.member_dim)
            .map(|(dim, values)| (dim.clone(), values.clone()))
            .collect();

        debug!(
            members,
            points = mean_snowfall.data.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Derived snowfall fields"
        );

        Ok(DerivedFields {
            mean_snowfall,
            probability_of_snow,
            coords,
            members,
        })
    }

    /// Check both fields agree and return the member axis.
    fn validate(&self, temperature: &Field, precipitation: &Field) -> ForecastResult<usize> {
        if temperature.dims != precipitation.dims {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} has dimensions {:?} but {} has {:?}",
                temperature.name, temperature.dims, precipitation.name, precipitation.dims
            )));
        }
        if temperature.shape() != precipitation.shape() {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} has shape {:?} but {} has {:?}",
                temperature.name,
                temperature.shape(),
                precipitation.name,
                precipitation.shape()
            )));
        }
        temperature
            .axis_of(&self.schema.member_dim)
            .ok_or_else(|| ForecastError::MissingDimension(self.schema.member_dim.clone()))
    }

    /// Reduce one grid point's members to (mean snowfall, probability %).
    fn reduce_members(&self, temps: ArrayView1<f32>, precips: ArrayView1<f32>) -> (f32, f32) {
        let mut sum = 0.0f64;
        let mut eligible = 0usize;
        let mut snowing = 0usize;

        for (&t, &p) in temps.iter().zip(precips.iter()) {
            // NaN temperatures fail the comparison and are excluded
            if !(t < self.options.freezing_point_k) || p.is_nan() {
                continue;
            }
            eligible += 1;
            sum += p as f64;
            if p > self.options.snow_epsilon {
                snowing += 1;
            }
        }

        let mean = if eligible == 0 {
            f32::NAN
        } else {
            (sum / eligible as f64) as f32
        };

        let denominator = match self.options.basis {
            ProbabilityBasis::EligibleMembers => eligible,
            ProbabilityBasis::AllMembers => temps.len(),
        };
        let probability = if denominator == 0 {
            0.0
        } else {
            (snowing as f64 * 100.0 / denominator as f64) as f32
        };

        (mean, probability)
    }
}

/// Derive with default thresholds.
pub fn derive(dataset: &Dataset, schema: &EnsembleSchema) -> ForecastResult<DerivedFields> {
    SnowDeriver::new(schema.clone()).derive(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn deriver() -> SnowDeriver {
        SnowDeriver::default()
    }

    #[test]
    fn test_reduce_strictly_below_freezing() {
        let (mean, prob) = deriver().reduce_members(
            array![273.15f32, 273.0].view(),
            array![5.0f32, 1.0].view(),
        );
        assert_eq!(mean, 1.0);
        assert_eq!(prob, 100.0);
    }

    #[test]
    fn test_reduce_freezing_point_compares_in_f32() {
        let rounded_up = 273.149_999_9_f64 as f32;
        assert_eq!(rounded_up, FREEZING_POINT_K);
        let just_below = f32::from_bits(FREEZING_POINT_K.to_bits() - 1);

        let (mean, prob) = deriver().reduce_members(
            array![rounded_up, just_below].view(),
            array![4.0f32, 2.0].view(),
        );
        assert_eq!(mean, 2.0);
        assert_eq!(prob, 100.0);
    }

    #[test]
    fn test_reduce_no_eligible_members() {
        let (mean, prob) =
            deriver().reduce_members(array![280.0f32, 290.0].view(), array![1.0f32, 1.0].view());
        assert!(mean.is_nan());
        assert_eq!(prob, 0.0);
    }

    #[test]
    fn test_reduce_skips_missing_precipitation() {
        let (mean, prob) = deriver().reduce_members(
            array![260.0f32, 260.0, 260.0].view(),
            array![f32::NAN, 2.0, 0.0].view(),
        );
        assert_eq!(mean, 1.0);
        assert_eq!(prob, 50.0);
    }

    #[test]
    fn test_reduce_nan_temperature_is_excluded() {
        let (mean, _) =
            deriver().reduce_members(array![f32::NAN, 260.0].view(), array![9.0f32, 3.0].view());
        assert_eq!(mean, 3.0);
    }

    #[test]
    fn test_reduce_all_members_basis() {
        let deriver = deriver().with_options(DeriveOptions {
            basis: ProbabilityBasis::AllMembers,
            ..Default::default()
        });
        let (_, prob) = deriver.reduce_members(
            array![260.0f32, 280.0, 260.0, 260.0].view(),
            array![1.0f32, 1.0, 0.0, 1.0].view(),
        );
        assert_eq!(prob, 50.0);
    }

    #[test]
    fn test_epsilon_threshold_is_exclusive() {
        let (_, prob) = deriver().reduce_members(
            array![260.0f32, 260.0].view(),
            array![SNOW_EPSILON, 2.0e-9].view(),
        );
        assert_eq!(prob, 50.0);
    }
}
