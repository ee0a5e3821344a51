//! Common test fixtures for snowfall derivation tests.
//!
//! This module provides pre-defined scenarios with hand-computed expected
//! results.

/// The four-member single-point scenario.
///
/// Members 0, 2 and 3 are below freezing; member 1 is not. Precipitation of
/// member 3 (2e-9) sits just above the 1e-9 snow threshold.
pub mod four_member {
    use forecast_common::Dataset;

    pub const TEMPERATURES: [f32; 4] = [260.0, 280.0, 265.0, 270.0];
    pub const PRECIPITATION: [f32; 4] = [0.5, 0.5, 0.0, 2.0e-9];

    /// (0.5 + 0.0 + 2e-9) / 3
    pub const EXPECTED_MEAN: f64 = 0.5 / 3.0;
    /// 2 of 3 eligible members produce snow
    pub const EXPECTED_PROBABILITY_ELIGIBLE: f64 = 200.0 / 3.0;
    /// 2 of all 4 members produce snow
    pub const EXPECTED_PROBABILITY_ALL: f64 = 50.0;

    pub fn dataset() -> Dataset {
        crate::single_point_ensemble(&TEMPERATURES, &PRECIPITATION)
    }
}

/// A member exactly at the freezing point must not count.
pub mod freezing_boundary {
    use forecast_common::Dataset;

    pub const TEMPERATURES: [f32; 3] = [273.15, 272.0, 290.0];
    pub const PRECIPITATION: [f32; 3] = [4.0, 1.0, 1.0];

    /// Only member 1 is eligible
    pub const EXPECTED_MEAN: f64 = 1.0;
    pub const EXPECTED_PROBABILITY_ELIGIBLE: f64 = 100.0;

    pub fn dataset() -> Dataset {
        crate::single_point_ensemble(&TEMPERATURES, &PRECIPITATION)
    }
}

/// Common region definitions for testing.
pub mod region {
    /// Latitudes of a small descending 1-degree grid
    pub const LATS: [f64; 4] = [37.0, 36.0, 35.0, 34.0];
    /// Longitudes of a small ascending 1-degree grid
    pub const LONS: [f64; 5] = [69.0, 70.0, 71.0, 72.0, 73.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_member_shapes() {
        let ds = four_member::dataset();
        assert_eq!(ds.require("t2m").unwrap().shape(), &[4, 1, 1, 1]);
        assert_eq!(ds.require("tprate").unwrap().shape(), &[4, 1, 1, 1]);
    }
}
