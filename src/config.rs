//! Runtime configuration.
//!
//! Store credentials come from the environment (a `.env` file is honoured by
//! the binary). Analytics tuning lives in an optional JSON file:
//! ```json
//! {
//!   "top_categories": 5,
//!   "trend_window_days": 7,
//!   "max_trend_buckets": 7,
//!   "utc_offset_minutes": 60
//! }
//! ```
//! Missing keys fall back to the defaults above; without
//! `utc_offset_minutes` days follow the host's local time zone.

use anyhow::{Context, Result, bail};
use chrono::Duration;
use serde::Deserialize;

use crate::analytics::trends::{DayBoundary, TrendWindow};

pub const STORE_URL_VAR: &str = "STORE_URL";
pub const STORE_API_KEY_VAR: &str = "STORE_API_KEY";

/// Longest accepted `trend_window_days`, roughly ten years.
pub const MAX_TREND_WINDOW_DAYS: u32 = 3650;

/// Where the relational store lives and how to authenticate against it.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: require_var(STORE_URL_VAR)?,
            api_key: require_var(STORE_API_KEY_VAR)?,
        })
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn require_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub top_categories: usize,
    pub trend_window_days: u32,
    pub max_trend_buckets: usize,
    pub utc_offset_minutes: Option<i32>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_categories: 5,
            trend_window_days: 7,
            max_trend_buckets: 7,
            utc_offset_minutes: None,
        }
    }
}

impl AnalyticsConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        let config: Self =
            serde_json::from_str(&content).with_context(|| format!("invalid config in {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trend_window_days == 0 {
            bail!("trend_window_days must be at least 1");
        }
        if self.trend_window_days > MAX_TREND_WINDOW_DAYS {
            bail!(
                "trend_window_days must be at most {MAX_TREND_WINDOW_DAYS}, got {}",
                self.trend_window_days
            );
        }
        if let Some(minutes) = self.utc_offset_minutes {
            DayBoundary::from_offset_minutes(minutes)?;
        }
        Ok(())
    }

    pub fn trend_window(&self) -> Result<TrendWindow> {
        self.validate()?;
        let boundary = match self.utc_offset_minutes {
            Some(minutes) => DayBoundary::from_offset_minutes(minutes)?,
            None => DayBoundary::Local,
        };

        Ok(TrendWindow {
            span: Duration::days(i64::from(self.trend_window_days)),
            max_buckets: self.max_trend_buckets,
            boundary,
        })
    }
}
