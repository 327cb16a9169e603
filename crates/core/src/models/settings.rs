use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::CoreError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Upper bound on every duration setting: one day.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// Runtime configuration of the tracker.
///
/// Every field has a default, so a settings file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where holdings are persisted.
    pub data_file: PathBuf,

    /// Period of the automatic price refresh.
    pub refresh_interval_secs: u64,

    /// Upper bound on a single price request.
    pub fetch_timeout_secs: u64,

    /// Minimum gap between the start of two fetches caused by manual
    /// refreshes or holding edits. `0` disables the cooldown.
    pub min_refresh_gap_secs: u64,

    /// Base URL of the CoinGecko-compatible price API.
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("portfolio.json"),
            refresh_interval_secs: 60,
            fetch_timeout_secs: 10,
            min_refresh_gap_secs: 5,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::ValidationError(
                "refresh_interval_secs must be positive".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "fetch_timeout_secs must be positive".into(),
            ));
        }
        for (field, secs) in [
            ("refresh_interval_secs", self.refresh_interval_secs),
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("min_refresh_gap_secs", self.min_refresh_gap_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(CoreError::ValidationError(format!(
                    "{field} must be at most {MAX_DURATION_SECS}"
                )));
            }
        }
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "api_base_url must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn min_refresh_gap(&self) -> Duration {
        Duration::from_secs(self.min_refresh_gap_secs)
    }
}
