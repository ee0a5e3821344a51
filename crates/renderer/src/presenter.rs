//! Dashboard figures for derived and daily snowfall fields.
//!
//! Pure presentation: fields arrive already derived, nothing here changes a
//! value, it only slices, orients and colors.

use std::time::Instant;

use chrono::NaiveDate;
use forecast_common::{
    DailyField, DerivedFields, EnsembleSchema, Field, ForecastError, ForecastResult, GeoGrid,
};
use ndarray::Axis;
use tracing::debug;

use crate::colormap::{ColorScale, Colormap};
use crate::figure::{render_figure, FigureLayout, Panel, RenderedImage};

pub const MEAN_PANEL_TITLE: &str = "1. Mean 'Most Likely' Snowfall Forecast";
pub const PROBABILITY_PANEL_TITLE: &str = "2. Probability of Any Snowfall (%)";

/// Side-by-side mean snowfall and probability of snow for one time slice.
///
/// The mean panel uses viridis scaled to the slice's own finite range; the
/// probability panel uses Blues fixed to 0-100 %.
pub fn render_comparison(
    fields: &DerivedFields,
    schema: &EnsembleSchema,
    time_index: usize,
    layout: &FigureLayout,
) -> ForecastResult<RenderedImage> {
    let start = Instant::now();

    let mean = slice_time(&fields.mean_snowfall, &schema.time_dim, time_index)?;
    let probability = slice_time(&fields.probability_of_snow, &schema.time_dim, time_index)?;

    let mean_grid = orient(mean.to_geo_grid(&fields.coords, &schema.lat_dim, &schema.lon_dim)?);
    let probability_grid =
        orient(probability.to_geo_grid(&fields.coords, &schema.lat_dim, &schema.lon_dim)?);

    let panels = [
        Panel {
            title: MEAN_PANEL_TITLE.to_string(),
            scale: ColorScale::from_range(mean_grid.value_range()),
            grid: &mean_grid,
            colormap: Colormap::viridis(),
            colorbar_label: mean.units.clone(),
        },
        Panel {
            title: PROBABILITY_PANEL_TITLE.to_string(),
            grid: &probability_grid,
            colormap: Colormap::blues(),
            scale: ColorScale::new(0.0, 100.0),
            colorbar_label: Some("%".to_string()),
        },
    ];

    let image = render_figure(layout, &panels)?;
    debug!(
        time_index,
        width = image.width,
        height = image.height,
        bytes = image.png.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rendered comparison figure"
    );
    Ok(image)
}

/// Single-panel daily snowfall intensity map.
pub fn render_daily(
    field: &DailyField,
    date: NaiveDate,
    layout: &FigureLayout,
) -> ForecastResult<RenderedImage> {
    let start = Instant::now();
    let grid = orient(daily_grid(field)?);

    let panel = Panel {
        title: daily_title(date),
        scale: ColorScale::from_range(grid.value_range()),
        grid: &grid,
        colormap: Colormap::blues(),
        colorbar_label: field.field.units.clone(),
    };

    let image = render_figure(layout, &[panel])?;
    debug!(
        variable = field.name(),
        %date,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rendered daily figure"
    );
    Ok(image)
}

/// `Snowfall Intensity - December 7, 2025`
pub fn daily_title(date: NaiveDate) -> String {
    format!("Snowfall Intensity - {}", date.format("%B %-d, %Y"))
}

/// Select one time index; fields without a time dimension accept index 0.
fn slice_time(field: &Field, time_dim: &str, index: usize) -> ForecastResult<Field> {
    match field.axis_of(time_dim) {
        Some(_) => field.select(time_dim, index),
        None if index == 0 => Ok(field.clone()),
        None => Err(ForecastError::index_out_of_range(time_dim, index, 1)),
    }
}

/// Daily files name their axes inconsistently; accept the common spellings.
fn daily_grid(daily: &DailyField) -> ForecastResult<GeoGrid> {
    const LAT_NAMES: &[&str] = &["latitude", "lat", "y"];
    const LON_NAMES: &[&str] = &["longitude", "lon", "x"];

    let dims = &daily.field.dims;
    let find = |names: &[&'static str]| {
        names
            .iter()
            .find(|n| dims.iter().any(|d| d == *n))
            .copied()
    };
    let lat = find(LAT_NAMES).ok_or_else(|| ForecastError::MissingDimension("latitude".into()))?;
    let lon = find(LON_NAMES).ok_or_else(|| ForecastError::MissingDimension("longitude".into()))?;
    daily.to_geo_grid(lat, lon)
}

/// North up and east right.
fn orient(grid: GeoGrid) -> GeoGrid {
    let mut grid = grid.north_up();
    let descending = grid.lons.len() > 1 && grid.lons[0] > grid.lons[grid.lons.len() - 1];
    if descending {
        grid.values.invert_axis(Axis(1));
        grid.values = grid.values.as_standard_layout().to_owned();
        grid.lons.reverse();
    }
    grid
}
