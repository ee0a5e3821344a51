//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use forecast_common::{DaySelection, ForecastError};
use serde::{Deserialize, Serialize};
use snow_deriver::CacheStats;
use tracing::{error, instrument, warn};

use crate::metrics::{MetricsSnapshot, RenderKind};
use crate::page;
use crate::rendering;
use crate::state::AppState;

// ============================================================================
// Page and tab list
// ============================================================================

/// GET / - Dashboard page
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    Html(page::render_page(&state.config))
}

/// One month tab.
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthTab {
    pub key: String,
    pub label: String,
    pub heading: String,
    pub file: String,
    pub available: bool,
}

/// GET /api/months - Configured forecast months in tab order
pub async fn months_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<MonthTab>> {
    let config = &state.config;
    let tabs = config
        .months
        .iter()
        .map(|month| {
            let path = config.month_path(month);
            MonthTab {
                key: month.key(),
                label: month.label(),
                heading: format!("Forecast for {}", month.label()),
                file: month.forecast_file_name(&config.location, &config.extension),
                available: path.is_file(),
            }
        })
        .collect();
    Json(tabs)
}

// ============================================================================
// Figures
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    /// Forecast time index, 0 when absent
    pub time: Option<usize>,
}

/// GET /render/month/:key - Mean snowfall and probability figure
#[instrument(skip(state))]
pub async fn month_render_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<MonthParams>,
) -> Response {
    let month = match state.config.find_month(&key) {
        Ok(month) => month,
        Err(e) => return error_response(&e, &key),
    };

    match rendering::month_figure(&state, month, params.time.unwrap_or(0)).await {
        Ok(image) => png_response(image.png.clone()),
        Err(e) => {
            state.metrics.record_render_error(RenderKind::Month);
            error_response(&e, &month.label())
        }
    }
}

/// GET /render/daily/:day - Daily snowfall intensity figure
#[instrument(skip(state))]
pub async fn daily_render_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(day): Path<u32>,
) -> Response {
    let period = state.config.daily.period;
    let day = match DaySelection::new(day) {
        Ok(day) => day,
        Err(e) => return error_response(&e, &format!("{} {}", period.month.name(), day)),
    };
    let subject = period.day_label(day);

    match rendering::daily_figure(&state, day).await {
        Ok(image) => png_response(image.png.clone()),
        Err(e) => {
            state.metrics.record_render_error(RenderKind::Daily);
            error_response(&e, &subject)
        }
    }
}

/// GET /api/daily/:day/summary - Structure of a daily file
#[instrument(skip(state))]
pub async fn daily_summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(day): Path<u32>,
) -> Response {
    let period = state.config.daily.period;
    let day = match DaySelection::new(day) {
        Ok(day) => day,
        Err(e) => return error_response(&e, &format!("{} {}", period.month.name(), day)),
    };

    match rendering::daily_summary(&state, day).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(&e, &period.day_label(day)),
    }
}

// ============================================================================
// Health and metrics
// ============================================================================

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let derived = state.derived_cache.lock().await.stats();
    let images = state.image_cache.lock().await.stats();
    let snapshot = state.metrics.snapshot();

    let mut output = String::new();

    output.push_str(&format!(
        "# HELP snowcast_uptime_seconds Seconds since the dashboard started\n# TYPE snowcast_uptime_seconds gauge\nsnowcast_uptime_seconds {}\n",
        snapshot.uptime_secs
    ));
    output.push_str(&format!(
        "# HELP snowcast_derived_cache_entries Derived field sets held in memory\n# TYPE snowcast_derived_cache_entries gauge\nsnowcast_derived_cache_entries {}\n",
        derived.entries
    ));
    output.push_str(&format!(
        "# HELP snowcast_image_cache_entries Rendered figures held in memory\n# TYPE snowcast_image_cache_entries gauge\nsnowcast_image_cache_entries {}\n",
        images.entries
    ));
    output.push_str(&format!(
        "# HELP snowcast_cache_evictions_total Entries evicted from the memo caches\n# TYPE snowcast_cache_evictions_total counter\nsnowcast_cache_evictions_total {}\n",
        derived.evictions + images.evictions
    ));

    // Counters and histograms recorded through the `metrics` macros
    if let Some(handle) = &state.prometheus {
        output.push_str(&handle.render());
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        output,
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct ApiMetrics {
    pub metrics: MetricsSnapshot,
    pub derived_cache: CacheStats,
    pub image_cache: CacheStats,
}

/// GET /api/metrics - JSON metrics
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ApiMetrics> {
    let derived_cache = state.derived_cache.lock().await.stats();
    let image_cache = state.image_cache.lock().await.stats();
    Json(ApiMetrics {
        metrics: state.metrics.snapshot(),
        derived_cache,
        image_cache,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn png_response(png: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        png,
    )
        .into_response()
}

/// Plain-text message shown inline in the affected tab or panel.
fn error_response(err: &ForecastError, subject: &str) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(error = %err, subject, "Request failed");
    } else {
        warn!(error = %err, subject, status = status.as_u16(), "Request rejected");
    }

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        err.user_message(subject),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_response_status() {
        let missing = ForecastError::FileNotFound(PathBuf::from("data/december_day_5.nc"));
        assert_eq!(error_response(&missing, "December 5").status(), StatusCode::NOT_FOUND);

        let bad_day = ForecastError::DayOutOfRange(32);
        assert_eq!(error_response(&bad_day, "December 32").status(), StatusCode::BAD_REQUEST);

        let shape = ForecastError::MissingField("t2m".into());
        assert_eq!(
            error_response(&shape, "December 2025").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
