//! Screener configuration, loadable from TOML.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. The configuration is fixed once an engine is built from it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::coarse::{LiquidityMetric, UpdateScope};
use crate::domain::{Exchange, Sector};
use crate::indicators::SHORT_WINDOW;
use crate::schedule::RebalanceSchedule;
use crate::state::EvictionPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Complete selection-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Instruments kept after the dollar-volume sort.
    pub coarse_count: usize,

    /// Cap on the EV/EBITDA-ranked subset, and the Stage B quota numerator.
    pub fine_count: usize,

    /// Final portfolio size.
    pub portfolio_count: usize,

    /// Long SMA window.
    pub long_window: usize,

    /// Short SMA window.
    pub short_window: usize,

    /// Sectors taking part in stratified selection, in iteration order.
    pub sectors: Vec<Sector>,

    /// Accepted primary listing exchanges.
    pub exchanges: Vec<Exchange>,

    /// Required company country code.
    pub country: String,

    /// Strict lower bound on shares × EPS × P/E.
    pub min_market_cap_proxy: f64,

    /// Strict lower bound on days since IPO.
    pub min_ipo_age_days: i64,

    /// Date-to-throttle-key mapping.
    pub schedule: RebalanceSchedule,

    /// Which observations update instrument state.
    pub update_scope: UpdateScope,

    /// Value published per qualifying instrument for the sector sort.
    pub liquidity_metric: LiquidityMetric,

    /// Idle-instrument eviction.
    pub eviction: EvictionPolicy,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            coarse_count: 500,
            fine_count: 50,
            portfolio_count: 10,
            long_window: 200,
            short_window: SHORT_WINDOW,
            sectors: Sector::ALL.to_vec(),
            exchanges: vec![Exchange::Nyse, Exchange::Nasdaq],
            country: "USA".to_string(),
            min_market_cap_proxy: 5e8,
            min_ipo_age_days: 180,
            schedule: RebalanceSchedule::default(),
            update_scope: UpdateScope::default(),
            liquidity_metric: LiquidityMetric::default(),
            eviction: EvictionPolicy::default(),
        }
    }
}

impl ScreenerConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ScreenerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("coarse_count", self.coarse_count),
            ("fine_count", self.fine_count),
            ("portfolio_count", self.portfolio_count),
            ("long_window", self.long_window),
            ("short_window", self.short_window),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be >= 1".into(),
                });
            }
        }
        if self.sectors.is_empty() {
            return Err(ConfigError::Invalid {
                field: "sectors",
                reason: "at least one sector is required".into(),
            });
        }
        if self.exchanges.is_empty() {
            return Err(ConfigError::Invalid {
                field: "exchanges",
                reason: "at least one exchange is required".into(),
            });
        }
        if let Some(dup) = first_duplicate(&self.sectors) {
            return Err(ConfigError::Invalid {
                field: "sectors",
                reason: format!("sector {} is listed more than once", dup.code()),
            });
        }
        if let Some(dup) = first_duplicate(&self.exchanges) {
            return Err(ConfigError::Invalid {
                field: "exchanges",
                reason: format!("exchange {} is listed more than once", dup.code()),
            });
        }
        if !self.min_market_cap_proxy.is_finite() {
            return Err(ConfigError::Invalid {
                field: "min_market_cap_proxy",
                reason: format!("must be finite, got {}", self.min_market_cap_proxy),
            });
        }
        if self.min_ipo_age_days < 0 {
            return Err(ConfigError::Invalid {
                field: "min_ipo_age_days",
                reason: format!("must be >= 0, got {}", self.min_ipo_age_days),
            });
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two runs with the same fingerprint screened with identical parameters.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn first_duplicate<T: PartialEq>(items: &[T]) -> Option<&T> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(*item))
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_parameters() {
        let config = ScreenerConfig::default();
        assert_eq!(config.coarse_count, 500);
        assert_eq!(config.fine_count, 50);
        assert_eq!(config.portfolio_count, 10);
        assert_eq!(config.long_window, 200);
        assert_eq!(config.short_window, 5);
        assert_eq!(config.sectors, Sector::ALL.to_vec());
        assert_eq!(config.exchanges, vec![Exchange::Nyse, Exchange::Nasdaq]);
        assert_eq!(config.country, "USA");
        assert_eq!(config.min_market_cap_proxy, 5e8);
        assert_eq!(config.min_ipo_age_days, 180);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ScreenerConfig::from_toml_str(
            r#"
            portfolio_count = 20
            schedule = "calendar_month"
            sectors = ["N", "T"]
            eviction = { type = "idle_cycles", cycles = 30 }
            "#,
        )
        .unwrap();
        assert_eq!(config.portfolio_count, 20);
        assert_eq!(config.schedule, RebalanceSchedule::CalendarMonth);
        assert_eq!(config.sectors, vec![Sector::Normal, Sector::Transportation]);
        assert_eq!(config.eviction, EvictionPolicy::IdleCycles { cycles: 30 });
        assert_eq!(config.coarse_count, 500);
    }

    #[test]
    fn rejects_zero_counts() {
        let err = ScreenerConfig::from_toml_str("fine_count = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "fine_count", .. }));
    }

    #[test]
    fn rejects_empty_sector_set() {
        let config = ScreenerConfig {
            sectors: vec![],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "sectors", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_sectors_and_exchanges() {
        let err = ScreenerConfig::from_toml_str("sectors = [\"N\", \"T\", \"N\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "sectors", .. }));

        let config = ScreenerConfig {
            exchanges: vec![Exchange::Nasdaq, Exchange::Nasdaq],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "exchanges", .. })
        ));
    }

    #[test]
    fn rejects_unknown_sector_code() {
        let err = ScreenerConfig::from_toml_str("sectors = [\"X\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let config = ScreenerConfig {
            min_market_cap_proxy: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let config = ScreenerConfig {
            update_scope: UpdateScope::FullBatch,
            liquidity_metric: LiquidityMetric::Placeholder,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(ScreenerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn fingerprint_is_deterministic_and_param_sensitive() {
        let a = ScreenerConfig::default();
        let b = ScreenerConfig::default();
        let c = ScreenerConfig {
            coarse_count: 1000,
            ..Default::default()
        };
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "coarse_count = 250").unwrap();
        let config = ScreenerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.coarse_count, 250);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = ScreenerConfig::from_file("/nonexistent/screener.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
