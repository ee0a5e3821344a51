//! NetCDF fixture writers.
//!
//! Tests that exercise the real loader write small files into a temporary
//! directory with these helpers instead of relying on committed binaries.

use std::path::Path;

use forecast_common::{Dataset, Field};

/// Write every field and coordinate of a dataset to a NetCDF file.
///
/// Dimensions are declared in first-seen order across the fields; each
/// coordinate vector becomes a `f64` coordinate variable.
pub fn write_dataset_nc(path: &Path, dataset: &Dataset) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;

    let mut declared: Vec<String> = Vec::new();
    for field in &dataset.variables {
        for (dim, &len) in field.dims.iter().zip(field.shape()) {
            if !declared.contains(dim) {
                file.add_dimension(dim, len)?;
                declared.push(dim.clone());
            }
        }
    }

    for dim in &declared {
        if let Some(values) = dataset.coords.get(dim) {
            let mut var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
            var.put_values(values.as_slice(), ..)?;
        }
    }

    for field in &dataset.variables {
        write_field(&mut file, field)?;
    }

    for (name, value) in &dataset.attributes {
        file.add_attribute(name, value.as_str())?;
    }

    Ok(())
}

/// Write a daily file with one `(latitude, longitude)` variable.
pub fn write_daily_nc(
    path: &Path,
    variable: &str,
    lats: &[f64],
    lons: &[f64],
    values: &[f32],
) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    write_lat_lon(&mut file, lats, lons)?;

    let mut var = file.add_variable::<f32>(variable, &["latitude", "longitude"])?;
    var.put_attribute("units", "mm")?;
    var.put_values(values, ..)?;
    Ok(())
}

/// CF packing attributes for an `i16` variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: i16,
    pub missing_value: i16,
}

/// Write a daily file whose variable is stored as packed `i16`.
///
/// `stored` holds the raw integers; readers recover `stored * scale_factor + add_offset`.
pub fn write_packed_daily_nc(
    path: &Path,
    variable: &str,
    lats: &[f64],
    lons: &[f64],
    stored: &[i16],
    packing: Packing,
) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    write_lat_lon(&mut file, lats, lons)?;

    let mut var = file.add_variable::<i16>(variable, &["latitude", "longitude"])?;
    // _FillValue must precede the first write
    var.put_attribute("_FillValue", packing.fill_value)?;
    var.put_attribute("missing_value", packing.missing_value)?;
    var.put_attribute("scale_factor", packing.scale_factor)?;
    var.put_attribute("add_offset", packing.add_offset)?;
    var.put_attribute("units", "K")?;
    var.put_values(stored, ..)?;
    Ok(())
}

/// Write a file that declares dimensions and coordinates but no data variable.
pub fn write_coordinates_only_nc(path: &Path, lats: &[f64]) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_dimension("latitude", lats.len())?;
    let mut lat = file.add_variable::<f64>("latitude", &["latitude"])?;
    lat.put_values(lats, ..)?;
    Ok(())
}

fn write_lat_lon(
    file: &mut netcdf::FileMut,
    lats: &[f64],
    lons: &[f64],
) -> Result<(), netcdf::Error> {
    file.add_dimension("latitude", lats.len())?;
    file.add_dimension("longitude", lons.len())?;
    file.add_variable::<f64>("latitude", &["latitude"])?
        .put_values(lats, ..)?;
    file.add_variable::<f64>("longitude", &["longitude"])?
        .put_values(lons, ..)?;
    Ok(())
}

fn write_field(file: &mut netcdf::FileMut, field: &Field) -> Result<(), netcdf::Error> {
    let dims: Vec<&str> = field.dims.iter().map(String::as_str).collect();
    let mut var = file.add_variable::<f32>(&field.name, &dims)?;
    if let Some(units) = &field.units {
        var.put_attribute("units", units.as_str())?;
    }
    let values: Vec<f32> = field.data.iter().copied().collect();
    var.put_values(&values, ..)?;
    Ok(())
}
