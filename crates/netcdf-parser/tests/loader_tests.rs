//! Tests for loading ensemble and daily NetCDF files.
//!
//! Fixture files are written into a temporary directory with the
//! test-utils writers, then read back through the public loaders.

use forecast_common::{EnsembleSchema, ForecastError};
use netcdf_parser::{describe, open_daily, open_ensemble, NetCdfError};
use test_utils::{
    assert_approx_eq, fixtures::four_member, temp_test_dir, write_coordinates_only_nc,
    write_daily_nc, write_dataset_nc, write_packed_daily_nc, EnsembleBuilder, Packing,
};

// ============================================================================
// Ensemble files
// ============================================================================

#[test]
fn test_open_ensemble_reads_fields_and_coordinates() {
    let dir = temp_test_dir();
    let path = dir.path().join("kp_december_2025_forecast.nc");
    let source = EnsembleBuilder::new(3, 2, 4, 5).build(|m, t, row, col| {
        (260.0 + m as f32, (t * 100 + row * 10 + col) as f32 * 1.0e-9)
    });
    write_dataset_nc(&path, &source).unwrap();

    let ds = open_ensemble(&path, &EnsembleSchema::default()).unwrap();

    let t2m = ds.require("t2m").unwrap();
    assert_eq!(t2m.shape(), &[3, 2, 4, 5]);
    assert_eq!(
        t2m.dims,
        vec!["number", "forecast_reference_time", "latitude", "longitude"]
    );
    assert_eq!(t2m.units.as_deref(), Some("K"));
    assert_eq!(t2m.data[[2, 0, 0, 0]], 262.0);

    let tprate = ds.require("tprate").unwrap();
    assert_eq!(tprate, source.require("tprate").unwrap());

    assert_eq!(ds.coord("latitude").unwrap(), &[37.0, 36.0, 35.0, 34.0]);
    assert_eq!(ds.path.as_deref(), Some(path.as_path()));
}

#[test]
fn test_open_ensemble_missing_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("kp_march_2026_forecast.nc");

    let err = open_ensemble(&path, &EnsembleSchema::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::NotFound(_)));
    assert!(matches!(ForecastError::from(err), ForecastError::FileNotFound(_)));
}

#[test]
fn test_open_ensemble_corrupt_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("broken.nc");
    std::fs::write(&path, b"this is not netcdf").unwrap();

    let err = open_ensemble(&path, &EnsembleSchema::default()).unwrap_err();
    assert!(matches!(err, NetCdfError::Open { .. }));
}

#[test]
fn test_open_ensemble_missing_variable() {
    let dir = temp_test_dir();
    let path = dir.path().join("no_precip.nc");
    let mut source = four_member::dataset();
    source.variables.retain(|f| f.name == "t2m");
    write_dataset_nc(&path, &source).unwrap();

    let err = open_ensemble(&path, &EnsembleSchema::default()).unwrap_err();
    let err = ForecastError::from(err);
    assert!(matches!(err, ForecastError::MissingField(ref name) if name == "tprate"));
}

#[test]
fn test_open_ensemble_custom_schema() {
    let dir = temp_test_dir();
    let path = dir.path().join("renamed.nc");
    let mut builder = EnsembleBuilder::new(2, 1, 1, 1);
    builder.schema.member_dim = "realization".to_string();
    builder.schema.temperature = "2t".to_string();
    write_dataset_nc(&path, &builder.build(|_, _, _, _| (250.0, 1.0))).unwrap();

    let ds = open_ensemble(&path, &builder.schema).unwrap();
    assert_eq!(ds.require("2t").unwrap().dims[0], "realization");

    // The default schema expects a "number" dimension
    assert!(open_ensemble(&path, &EnsembleSchema::default()).is_err());
}

// ============================================================================
// Daily files
// ============================================================================

#[test]
fn test_open_daily_first_data_variable() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_5.nc");
    let lats = [37.0, 36.0];
    let lons = [69.0, 70.0, 71.0];
    write_daily_nc(&path, "sf", &lats, &lons, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    let daily = open_daily(&path, None).unwrap();
    assert_eq!(daily.name(), "sf");
    assert_eq!(daily.field.units.as_deref(), Some("mm"));

    let grid = daily.to_geo_grid("latitude", "longitude").unwrap();
    assert_eq!(grid.values.dim(), (2, 3));
    assert_eq!(grid.values[[1, 2]], 5.0);
    assert_eq!(grid.lons, lons.to_vec());
}

#[test]
fn test_open_daily_configured_field() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_9.nc");
    write_daily_nc(&path, "sf", &[37.0], &[69.0, 70.0], &[1.5, 2.5]).unwrap();

    let daily = open_daily(&path, Some("sf")).unwrap();
    assert_eq!(daily.name(), "sf");
    assert_eq!(daily.field.data.iter().copied().collect::<Vec<_>>(), vec![1.5, 2.5]);
    assert_eq!(daily.coords.get("longitude").unwrap(), &vec![69.0, 70.0]);
}

#[test]
fn test_open_daily_unpacks_scaled_integers() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_10.nc");
    let packing = Packing {
        scale_factor: 0.01,
        add_offset: 273.15,
        fill_value: -32767,
        missing_value: -32766,
    };
    let stored: [i16; 6] = [0, 100, -500, -32767, -32766, 250];
    write_packed_daily_nc(&path, "t2m", &[37.0, 36.0], &[69.0, 70.0, 71.0], &stored, packing)
        .unwrap();

    let daily = open_daily(&path, Some("t2m")).unwrap();
    assert_eq!(daily.field.units.as_deref(), Some("K"));

    let values: Vec<f32> = daily.field.data.iter().copied().collect();
    assert_approx_eq!(values[0], 273.15, 1e-4);
    assert_approx_eq!(values[1], 274.15, 1e-4);
    assert_approx_eq!(values[2], 268.15, 1e-4);
    assert!(values[3].is_nan(), "_FillValue cell should be NaN");
    assert!(values[4].is_nan(), "missing_value cell should be NaN");
    assert_approx_eq!(values[5], 275.65, 1e-4);
}

#[test]
fn test_open_daily_masks_default_fill_magnitude() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_11.nc");
    // netCDF default float fill
    let fill = 9.969_21e36_f32;
    write_daily_nc(&path, "sf", &[37.0], &[69.0, 70.0, 71.0], &[0.5, fill, -fill]).unwrap();

    let daily = open_daily(&path, None).unwrap();
    let values: Vec<f32> = daily.field.data.iter().copied().collect();
    assert_eq!(values[0], 0.5);
    assert!(values[1].is_nan());
    assert!(values[2].is_nan());
}

#[test]
fn test_open_daily_configured_field_missing() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_6.nc");
    write_daily_nc(&path, "sf", &[1.0], &[2.0], &[0.5]).unwrap();

    let err = open_daily(&path, Some("snow_depth")).unwrap_err();
    assert!(matches!(err, NetCdfError::MissingData(ref name) if name == "snow_depth"));
}

#[test]
fn test_open_daily_without_data_variables() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_7.nc");
    write_coordinates_only_nc(&path, &[1.0, 2.0]).unwrap();

    let err = open_daily(&path, None).unwrap_err();
    assert!(matches!(err, NetCdfError::NoDataVariables(_)));
}

#[test]
fn test_describe_marks_coordinate_variables() {
    let dir = temp_test_dir();
    let path = dir.path().join("december_day_8.nc");
    write_daily_nc(&path, "sf", &[1.0, 2.0], &[3.0], &[0.1, 0.2]).unwrap();

    let summary = describe(&path).unwrap();
    assert_eq!(summary.dimensions.len(), 2);

    let sf = summary.variables.iter().find(|v| v.name == "sf").unwrap();
    assert!(!sf.is_coordinate);
    assert_eq!(sf.dims, vec!["latitude", "longitude"]);

    let lat = summary.variables.iter().find(|v| v.name == "latitude").unwrap();
    assert!(lat.is_coordinate);
}
