//! Ensemble snowfall derivation.
//!
//! Collapses the ensemble-member dimension of a temperature/precipitation
//! dataset into two fields: the mean snowfall over members below freezing,
//! and the percentage of members that produce snow.
//!
//! # Example
//!
//! ```
//! use forecast_common::{Dataset, EnsembleSchema, Field};
//! use ndarray::{ArrayD, IxDyn};
//!
//! let dims = vec!["number".to_string()];
//! let t2m = Field::new("t2m", dims.clone(),
//!     ArrayD::from_shape_vec(IxDyn(&[2]), vec![260.0, 280.0]).unwrap()).unwrap();
//! let tprate = Field::new("tprate", dims,
//!     ArrayD::from_shape_vec(IxDyn(&[2]), vec![1.0, 1.0]).unwrap()).unwrap();
//! let ds = Dataset::new().with_field(t2m).with_field(tprate);
//!
//! let derived = snow_deriver::derive(&ds, &EnsembleSchema::default()).unwrap();
//! assert_eq!(derived.probability_of_snow.data.first(), Some(&100.0));
//! ```

pub mod cache;
pub mod derive;

pub use cache::{CacheStats, MemoCache, SourceKey, DEFAULT_CACHE_ENTRIES};
pub use derive::{
    derive, DeriveOptions, ProbabilityBasis, SnowDeriver, FREEZING_POINT_K, MEAN_SNOWFALL,
    PROBABILITY_OF_SNOW, SNOW_EPSILON,
};
