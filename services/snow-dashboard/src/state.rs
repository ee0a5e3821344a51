//! Application state and shared resources.

use anyhow::Result;
use forecast_common::DerivedFields;
use metrics_exporter_prometheus::PrometheusHandle;
use renderer::RenderedImage;
use snow_deriver::{MemoCache, SnowDeriver, SourceKey};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::DashboardConfig;
use crate::metrics::DashboardMetrics;

/// Shared application state.
pub struct AppState {
    pub config: DashboardConfig,
    pub deriver: SnowDeriver,
    /// Derived fields per monthly file
    pub derived_cache: Mutex<MemoCache<SourceKey, DerivedFields>>,
    /// Encoded figures per source file and view
    pub image_cache: Mutex<MemoCache<SourceKey, RenderedImage>>,
    pub metrics: DashboardMetrics,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: DashboardConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        config.validate()?;

        let deriver = SnowDeriver::new(config.schema.clone()).with_options(config.derive);
        let entries = config.cache_entries;

        info!(
            data_dir = %config.data_dir.display(),
            months = config.months.len(),
            cache_entries = entries,
            "Initialized dashboard state"
        );

        Ok(Self {
            deriver,
            derived_cache: Mutex::new(MemoCache::new(entries)),
            image_cache: Mutex::new(MemoCache::new(entries)),
            metrics: DashboardMetrics::new(),
            prometheus,
            config,
        })
    }
}
