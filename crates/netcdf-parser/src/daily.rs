//! Loading single-day files and describing file structure.

use std::path::Path;

use forecast_common::{
    DailyField, DatasetSummary, DimensionSummary, VariableSummary,
};
use tracing::{info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{
    dimension_names, open_file, read_coordinates, read_field, read_global_attributes,
};

/// Load the field of a daily file.
///
/// When `field` is `None` the first declared data variable is used;
/// coordinate variables never count as data variables.
pub fn open_daily(path: &Path, field: Option<&str>) -> NetCdfResult<DailyField> {
    let file = open_file(path)?;

    let name = match field {
        Some(name) => name.to_string(),
        None => {
            let dims = dimension_names(&file);
            let first = file
                .variables()
                .map(|v| v.name())
                .find(|name| !dims.contains(name))
                .ok_or_else(|| NetCdfError::NoDataVariables(path.to_path_buf()))?;
            warn!(
                path = %path.display(),
                variable = %first,
                "No daily field configured, using first data variable"
            );
            first
        }
    };

    let var = file
        .variable(&name)
        .ok_or_else(|| NetCdfError::MissingData(name.clone()))?;
    let field = read_field(&var)?;
    let coords = read_coordinates(&file);
    drop(file);

    info!(path = %path.display(), variable = %name, "Loaded daily file");
    Ok(DailyField { field, coords })
}

/// Describe dimensions, variables and global attributes of a file.
pub fn describe(path: &Path) -> NetCdfResult<DatasetSummary> {
    let file = open_file(path)?;
    let dim_names = dimension_names(&file);

    let dimensions = file
        .dimensions()
        .map(|d| DimensionSummary {
            name: d.name(),
            len: d.len(),
        })
        .collect();

    let variables = file
        .variables()
        .map(|var| {
            let name = var.name();
            let units = match var.attribute_value("units") {
                Some(Ok(netcdf::AttributeValue::Str(s))) => Some(s),
                _ => None,
            };
            VariableSummary {
                is_coordinate: dim_names.contains(&name),
                dims: var.dimensions().iter().map(|d| d.name()).collect(),
                name,
                units,
            }
        })
        .collect();

    Ok(DatasetSummary {
        path: path.display().to_string(),
        dimensions,
        variables,
        attributes: read_global_attributes(&file),
    })
}
