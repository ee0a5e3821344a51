//! Load, derive and render pipeline behind the figure endpoints.
//!
//! Every file read, derivation and rasterization runs on the blocking pool.
//! Results are memoized by source-file identity, so a replaced file is
//! picked up on the next request.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use forecast_common::{
    DatasetSummary, DaySelection, DerivedFields, ForecastError, ForecastMonth, ForecastResult,
};
use renderer::RenderedImage;
use snow_deriver::SourceKey;
use tracing::{debug, info};

use crate::metrics::RenderKind;
use crate::state::AppState;

const DERIVED_CACHE: &str = "derived";
const IMAGE_CACHE: &str = "image";

/// Mean and probability figure for one forecast month and time index.
pub async fn month_figure(
    state: &Arc<AppState>,
    month: ForecastMonth,
    time_index: usize,
) -> ForecastResult<Arc<RenderedImage>> {
    let path = state.config.month_path(&month);
    let key = source_key(&path)?.with_variant(format!("month:{}", time_index));

    if let Some(image) = cached_image(state, &key).await {
        return Ok(image);
    }

    let fields = derived_fields(state, month, &path).await?;
    let start = Instant::now();
    let worker = Arc::clone(state);
    let image = run_blocking(move || {
        renderer::render_comparison(
            &fields,
            worker.deriver.schema(),
            time_index,
            &worker.config.figure,
        )
    })
    .await?;

    let elapsed = start.elapsed();
    state.metrics.record_render(RenderKind::Month, elapsed);
    info!(
        month = %month.key(),
        time_index,
        elapsed_ms = elapsed.as_millis() as u64,
        "Rendered monthly figure"
    );
    Ok(state.image_cache.lock().await.insert(key, image))
}

/// Snowfall intensity figure for one day of the daily month.
pub async fn daily_figure(
    state: &Arc<AppState>,
    day: DaySelection,
) -> ForecastResult<Arc<RenderedImage>> {
    // Days the month does not have (e.g. 31 in a 30-day month) never reach the disk
    let date = state.config.daily.period.date(day)?;
    let path = state.config.daily_path(day);
    let key = source_key(&path)?.with_variant("daily");

    if let Some(image) = cached_image(state, &key).await {
        return Ok(image);
    }

    let start = Instant::now();
    let worker = Arc::clone(state);
    let image = run_blocking(move || {
        let field = netcdf_parser::open_daily(&path, worker.config.daily.field.as_deref())?;
        renderer::render_daily(&field, date, &worker.config.figure)
    })
    .await?;

    let elapsed = start.elapsed();
    state.metrics.record_render(RenderKind::Daily, elapsed);
    info!(
        day = day.get(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Rendered daily figure"
    );
    Ok(state.image_cache.lock().await.insert(key, image))
}

/// Structure of a daily file, for the raw-data view.
pub async fn daily_summary(
    state: &Arc<AppState>,
    day: DaySelection,
) -> ForecastResult<DatasetSummary> {
    state.config.daily.period.date(day)?;
    let path = state.config.daily_path(day);
    run_blocking(move || Ok(netcdf_parser::describe(&path)?)).await
}

async fn derived_fields(
    state: &Arc<AppState>,
    month: ForecastMonth,
    path: &Path,
) -> ForecastResult<Arc<DerivedFields>> {
    let key = source_key(path)?;

    if let Some(fields) = state.derived_cache.lock().await.get(&key) {
        state.metrics.record_cache_hit(DERIVED_CACHE);
        debug!(month = %month.key(), "Derived fields cache hit");
        return Ok(fields);
    }
    state.metrics.record_cache_miss(DERIVED_CACHE);

    let worker = Arc::clone(state);
    let path = path.to_path_buf();
    let fields = run_blocking(move || {
        let dataset = netcdf_parser::open_ensemble(&path, worker.deriver.schema())?;
        worker.deriver.derive(&dataset)
    })
    .await?;

    Ok(state.derived_cache.lock().await.insert(key, fields))
}

async fn cached_image(state: &AppState, key: &SourceKey) -> Option<Arc<RenderedImage>> {
    let hit = state.image_cache.lock().await.get(key);
    match hit {
        Some(image) => {
            state.metrics.record_cache_hit(IMAGE_CACHE);
            debug!(path = %key.path.display(), variant = %key.variant, "Image cache hit");
            Some(image)
        }
        None => {
            state.metrics.record_cache_miss(IMAGE_CACHE);
            None
        }
    }
}

/// Cache identity of a source file; a missing file is reported as such.
fn source_key(path: &Path) -> ForecastResult<SourceKey> {
    SourceKey::from_path(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ForecastError::FileNotFound(PathBuf::from(path)),
        _ => ForecastError::unreadable(path, err.to_string()),
    })
}

async fn run_blocking<T, F>(work: F) -> ForecastResult<T>
where
    F: FnOnce() -> ForecastResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ForecastError::InternalError(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kp_december_2025_forecast.nc");
        let err = source_key(&path).unwrap_err();
        assert!(matches!(err, ForecastError::FileNotFound(p) if p == path));
    }

    #[test]
    fn test_source_key_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("day.nc");
        std::fs::write(&path, b"one").unwrap();
        let first = source_key(&path).unwrap();
        std::fs::write(&path, b"three").unwrap();
        let second = source_key(&path).unwrap();
        assert_ne!(first, second);
    }
}
