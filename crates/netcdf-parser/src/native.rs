//! Native NetCDF reading using the netcdf library.
//!
//! Files are opened for the duration of a single load call and closed when
//! the `netcdf::File` handle drops, so no handle outlives a request.
//!
//! Packed variables are unpacked here: `scale_factor`/`add_offset` are
//! applied and `_FillValue`/`missing_value` become `NaN`.

use std::path::Path;
use std::sync::Once;

use forecast_common::{Coordinates, Field};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Values at or above this magnitude are treated as fill (CF default fill is ~9.97e36).
const FILL_MAGNITUDE: f64 = 1.0e30;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by calling
/// H5Eset_auto2 with null handlers. It only needs to be called once per
/// process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a NetCDF file, distinguishing a missing file from an unreadable one.
pub(crate) fn open_file(path: &Path) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();

    if !path.exists() {
        return Err(NetCdfError::NotFound(path.to_path_buf()));
    }

    netcdf::open(path).map_err(|e| NetCdfError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Names of all dimensions declared in the file.
pub(crate) fn dimension_names(file: &netcdf::File) -> Vec<String> {
    file.dimensions().map(|d| d.name()).collect()
}

/// Read one variable into a [`Field`], unpacking and masking fill values.
pub(crate) fn read_field(var: &netcdf::Variable) -> NetCdfResult<Field> {
    let name = var.name();
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    // netcdf-c converts any numeric storage type on read; f64 holds every
    // packed integer exactly so sentinels compare in their stored units
    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

    let scale_factor = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|attr| get_f64_attr(var, attr))
        .collect();

    let values: Vec<f32> = raw
        .into_iter()
        .map(|stored| {
            if is_fill(stored, &fill_values) {
                f32::NAN
            } else {
                // Narrowed after unpacking
                (stored * scale_factor + add_offset) as f32
            }
        })
        .collect();

    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
    let mut field = Field::new(name, dims, data)
        .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
    field.units = get_string_attr(var, "units");
    field.long_name = get_string_attr(var, "long_name");

    debug!(variable = %field.name, shape = ?field.shape(), "Read variable");
    Ok(field)
}

fn is_fill(stored: f64, fill_values: &[f64]) -> bool {
    !stored.is_finite() || stored.abs() >= FILL_MAGNITUDE || fill_values.contains(&stored)
}

/// Read the coordinate variable of every dimension that has one.
pub(crate) fn read_coordinates(file: &netcdf::File) -> Coordinates {
    let mut coords = Coordinates::new();
    for dim in dimension_names(file) {
        if let Some(var) = file.variable(&dim) {
            match var.get_values::<f64, _>(..) {
                Ok(values) => {
                    coords.insert(dim, values);
                }
                Err(e) => debug!(dimension = %dim, error = %e, "Skipping unreadable coordinate"),
            }
        }
    }
    coords
}

/// Global attributes rendered as strings.
pub(crate) fn read_global_attributes(file: &netcdf::File) -> Vec<(String, String)> {
    file.attributes()
        .filter_map(|attr| {
            let value = attr.value().ok()?;
            Some((attr.name().to_string(), format_attribute(value)))
        })
        .collect()
}

/// Human-readable attribute value.
pub(crate) fn format_attribute(value: netcdf::AttributeValue) -> String {
    use netcdf::AttributeValue as V;
    match value {
        V::Str(s) => s,
        V::Strs(v) => v.join(", "),
        V::Float(v) => v.to_string(),
        V::Double(v) => v.to_string(),
        V::Short(v) => v.to_string(),
        V::Int(v) => v.to_string(),
        V::Longlong(v) => v.to_string(),
        other => format!("{:?}", other),
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64, whatever its stored type.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    use netcdf::AttributeValue as V;
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        V::Uchar(v) => Some(v as f64),
        V::Schar(v) => Some(v as f64),
        V::Ushort(v) => Some(v as f64),
        V::Short(v) => Some(v as f64),
        V::Uint(v) => Some(v as f64),
        V::Int(v) => Some(v as f64),
        V::Ulonglong(v) => Some(v as f64),
        V::Longlong(v) => Some(v as f64),
        V::Float(v) => Some(v as f64),
        V::Double(v) => Some(v),
        _ => None,
    }
}

/// Helper to get a string attribute.
fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
