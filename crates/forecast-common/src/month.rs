//! Forecast month and day selection, and the file naming convention.

use std::fmt;
use std::str::FromStr;

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ForecastError, ForecastResult};

/// Lowest selectable day on the daily slider.
pub const MIN_DAY: u32 = 1;
/// Highest selectable day on the daily slider.
pub const MAX_DAY: u32 = 31;

/// One forecast month tab, e.g. December 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastMonth {
    #[serde(
        serialize_with = "serialize_month",
        deserialize_with = "deserialize_month"
    )]
    pub month: Month,
    pub year: i32,
}

impl ForecastMonth {
    pub fn new(month: Month, year: i32) -> Self {
        Self { month, year }
    }

    /// Lowercase month name used in file names, e.g. "december".
    pub fn month_slug(&self) -> String {
        self.month.name().to_lowercase()
    }

    /// URL-safe identifier, e.g. "december-2025".
    pub fn key(&self) -> String {
        format!("{}-{}", self.month_slug(), self.year)
    }

    /// Tab label, e.g. "December 2025".
    pub fn label(&self) -> String {
        format!("{} {}", self.month.name(), self.year)
    }

    /// Monthly ensemble file name: `{location}_{month}_{year}_forecast.{ext}`.
    pub fn forecast_file_name(&self, location: &str, extension: &str) -> String {
        format!(
            "{}_{}_{}_forecast.{}",
            location,
            self.month_slug(),
            self.year,
            extension
        )
    }

    /// Daily file name: `{month}_day_{n}.{ext}`.
    pub fn daily_file_name(&self, day: DaySelection, extension: &str) -> String {
        format!("{}_day_{}.{}", self.month_slug(), day.get(), extension)
    }

    /// Calendar date for a day of this month.
    ///
    /// The slider always offers 1-31, so days that do not exist in shorter
    /// months are reported as unavailable rather than wrapped.
    pub fn date(&self, day: DaySelection) -> ForecastResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.number_from_month(), day.get())
            .ok_or_else(|| ForecastError::InvalidDate(self.day_label(day)))
    }

    /// Short label for a day, e.g. "December 5".
    pub fn day_label(&self, day: DaySelection) -> String {
        format!("{} {}", self.month.name(), day.get())
    }
}

impl fmt::Display for ForecastMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for ForecastMonth {
    type Err = ForecastError;

    /// Parse a tab key such as "december-2025".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .rsplit_once('-')
            .ok_or_else(|| ForecastError::UnknownMonth(s.to_string()))?;
        let month =
            Month::from_str(month).map_err(|_| ForecastError::UnknownMonth(s.to_string()))?;
        let year = year
            .parse()
            .map_err(|_| ForecastError::UnknownMonth(s.to_string()))?;
        Ok(Self { month, year })
    }
}

fn serialize_month<S: Serializer>(month: &Month, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&month.name().to_lowercase())
}

fn deserialize_month<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Month, D::Error> {
    let name = String::deserialize(deserializer)?;
    Month::from_str(&name).map_err(|_| serde::de::Error::custom(format!("unknown month '{}'", name)))
}

/// A validated day-of-month from the daily slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DaySelection(u32);

impl DaySelection {
    /// Validate a day, rejecting anything outside 1-31.
    pub fn new(day: u32) -> ForecastResult<Self> {
        if (MIN_DAY..=MAX_DAY).contains(&day) {
            Ok(Self(day))
        } else {
            Err(ForecastError::DayOutOfRange(day))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DaySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
