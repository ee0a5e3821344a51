//! Probabilistic snowfall dashboard service library.
//!
//! Serves one page with a tab per forecast month (mean snowfall next to the
//! probability of any snow) and a day slider for daily snowfall maps.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod page;
pub mod rendering;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use config::{DailyConfig, DashboardConfig};
pub use state::AppState;

/// Build the application router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Page
        .route("/", get(handlers::index_handler))
        // API endpoints
        .route("/api/months", get(handlers::months_handler))
        .route("/api/daily/:day/summary", get(handlers::daily_summary_handler))
        .route("/api/metrics", get(handlers::api_metrics_handler))
        // Figures
        .route("/render/month/:key", get(handlers::month_render_handler))
        .route("/render/daily/:day", get(handlers::daily_render_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        // Layer extensions
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
