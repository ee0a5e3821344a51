//! Dashboard configuration.
//!
//! Loaded from a YAML file; every key is optional and falls back to the
//! winter 2025-2026 KP dashboard.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Month;
use forecast_common::{DaySelection, EnsembleSchema, ForecastError, ForecastMonth, ForecastResult};
use renderer::FigureLayout;
use serde::{Deserialize, Serialize};
use snow_deriver::{DeriveOptions, DEFAULT_CACHE_ENTRIES};
use tracing::{debug, info};

const DEFAULT_ABOUT: &str = "This forecast shows the 'most likely' snowfall (left) and the \
'confidence' (probability) of any snow (right) for each month. This is based on the 51-member \
ECMWF seasonal forecast made in October 2025.";

/// Top-level dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub subtitle: String,
    /// "About this Data" text
    pub about: String,
    /// Location prefix of monthly file names
    pub location: String,
    /// Directory holding the monthly files
    pub data_dir: PathBuf,
    /// File extension without the dot
    pub extension: String,
    pub schema: EnsembleSchema,
    /// One tab per month, in display order
    pub months: Vec<ForecastMonth>,
    pub daily: DailyConfig,
    pub figure: FigureLayout,
    /// Entries per memo cache
    pub cache_entries: usize,
    pub derive: DeriveOptions,
}

/// The daily snowfall section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConfig {
    #[serde(flatten)]
    pub period: ForecastMonth,
    /// Directory of daily files, relative to `data_dir` unless absolute
    #[serde(default = "default_daily_dir")]
    pub dir: PathBuf,
    /// Variable to plot; the first data variable when unset
    #[serde(default)]
    pub field: Option<String>,
}

fn default_daily_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            period: ForecastMonth::new(Month::December, 2025),
            dir: default_daily_dir(),
            field: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Probabilistic Snowfall Forecast for KP".to_string(),
            subtitle: "Winter 2025-2026 (from Oct 2025 Forecast)".to_string(),
            about: DEFAULT_ABOUT.to_string(),
            location: "kp".to_string(),
            data_dir: PathBuf::from("."),
            extension: "nc".to_string(),
            schema: EnsembleSchema::default(),
            months: vec![
                ForecastMonth::new(Month::December, 2025),
                ForecastMonth::new(Month::January, 2026),
                ForecastMonth::new(Month::February, 2026),
            ],
            daily: DailyConfig::default(),
            figure: FigureLayout::default(),
            cache_entries: DEFAULT_CACHE_ENTRIES,
            derive: DeriveOptions::default(),
        }
    }
}

impl DashboardConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(
            path = %path.display(),
            months = config.months.len(),
            "Loaded dashboard configuration"
        );
        Ok(config)
    }

    /// Parse and validate YAML content.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.months.is_empty() {
            bail!("at least one forecast month must be configured");
        }

        let mut seen = HashSet::new();
        for month in &self.months {
            if !seen.insert(month.key()) {
                bail!("forecast month {} is configured twice", month.label());
            }
        }

        if self.extension.is_empty() || self.extension.starts_with('.') {
            bail!("extension must be non-empty and given without a leading dot");
        }
        if self.location.is_empty() {
            bail!("location must not be empty");
        }
        if self.cache_entries == 0 {
            bail!("cache_entries must be greater than zero");
        }

        self.figure
            .validate()
            .map_err(|e| anyhow::anyhow!("figure: {}", e))?;

        debug!("Dashboard configuration is valid");
        Ok(())
    }

    /// Resolve a tab key such as `december-2025` against the configured months.
    pub fn find_month(&self, key: &str) -> ForecastResult<ForecastMonth> {
        let wanted: ForecastMonth = key.parse()?;
        self.months
            .iter()
            .copied()
            .find(|m| *m == wanted)
            .ok_or_else(|| ForecastError::UnknownMonth(key.to_string()))
    }

    /// Path of a monthly ensemble file.
    pub fn month_path(&self, month: &ForecastMonth) -> PathBuf {
        self.data_dir
            .join(month.forecast_file_name(&self.location, &self.extension))
    }

    /// Directory of the daily files.
    pub fn daily_dir(&self) -> PathBuf {
        if self.daily.dir.is_absolute() {
            self.daily.dir.clone()
        } else {
            self.data_dir.join(&self.daily.dir)
        }
    }

    /// Path of a daily file.
    pub fn daily_path(&self, day: DaySelection) -> PathBuf {
        self.daily_dir()
            .join(self.daily.period.daily_file_name(day, &self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_winter_dashboard() {
        let config = DashboardConfig::default();
        let keys: Vec<String> = config.months.iter().map(|m| m.key()).collect();
        assert_eq!(keys, vec!["december-2025", "january-2026", "february-2026"]);
        assert_eq!(
            config.month_path(&config.months[0]),
            PathBuf::from("./kp_december_2025_forecast.nc")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_daily_path() {
        let config = DashboardConfig {
            data_dir: PathBuf::from("/srv/snow"),
            ..Default::default()
        };
        let day = DaySelection::new(7).unwrap();
        assert_eq!(
            config.daily_path(day),
            PathBuf::from("/srv/snow/data/december_day_7.nc")
        );
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = DashboardConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
title: Snow Outlook
location: gb
months:
  - { month: january, year: 2027 }
daily:
  month: january
  year: 2027
  dir: /archive/daily
  field: sf
figure:
  panel_width: 300
derive:
  basis: all_members
"#;
        let config = DashboardConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.title, "Snow Outlook");
        assert_eq!(config.months.len(), 1);
        assert_eq!(config.daily.field.as_deref(), Some("sf"));
        assert_eq!(config.daily_dir(), PathBuf::from("/archive/daily"));
        assert_eq!(config.figure.panel_width, 300);
        assert_eq!(config.figure.panel_height, FigureLayout::default().panel_height);
        assert_eq!(
            config.derive.basis,
            snow_deriver::ProbabilityBasis::AllMembers
        );
        // Untouched keys keep their defaults
        assert_eq!(config.schema, EnsembleSchema::default());
    }

    #[test]
    fn test_rejects_duplicate_months() {
        let yaml = r#"
months:
  - { month: december, year: 2025 }
  - { month: December, year: 2025 }
"#;
        assert!(DashboardConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_empty_months_and_zero_panels() {
        assert!(DashboardConfig::from_yaml_str("months: []").is_err());
        assert!(DashboardConfig::from_yaml_str("figure: { panel_height: 0 }").is_err());
        assert!(DashboardConfig::from_yaml_str("extension: .nc").is_err());
    }

    #[test]
    fn test_find_month() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.find_month("january-2026").unwrap(),
            ForecastMonth::new(Month::January, 2026)
        );
        assert!(matches!(
            config.find_month("march-2026"),
            Err(ForecastError::UnknownMonth(_))
        ));
        assert!(config.find_month("nonsense").is_err());
    }
}
