//! Loading monthly ensemble forecast files.

use std::path::Path;
use std::time::Instant;

use forecast_common::{Dataset, EnsembleSchema};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{open_file, read_coordinates, read_field, read_global_attributes};

/// Load the temperature and precipitation variables of an ensemble file.
///
/// Only the two schema variables are read. The member dimension must be
/// declared by the file. The file is closed before this returns.
pub fn open_ensemble(path: &Path, schema: &EnsembleSchema) -> NetCdfResult<Dataset> {
    let start = Instant::now();
    let file = open_file(path)?;

    if file.dimension(&schema.member_dim).is_none() {
        return Err(NetCdfError::MissingData(format!(
            "{} dimension",
            schema.member_dim
        )));
    }

    let mut dataset = Dataset::new();
    for name in schema.required_fields() {
        let var = file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(name.to_string()))?;
        dataset.variables.push(read_field(&var)?);
    }

    dataset.coords = read_coordinates(&file);
    dataset.attributes = read_global_attributes(&file);
    dataset.path = Some(path.to_path_buf());
    drop(file);

    debug!(coords = ?dataset.coords.keys().collect::<Vec<_>>(), "Ensemble coordinates");
    info!(
        path = %path.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded ensemble file"
    );

    Ok(dataset)
}
