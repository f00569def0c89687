use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;

use crate::calc::calculate_volatility::Annualization;
use crate::data::csv_loader::DEFAULT_CLOSE_COLUMN;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub close_column: String,
    pub max_upload_bytes: usize,
    pub annualization: Annualization,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            close_column: DEFAULT_CLOSE_COLUMN.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            annualization: Annualization::SampleCount,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 127.0.0.1:8000")?;

        // An unset column keeps the source export's identifier; an empty one is a mistake
        let close_column =
            lookup("CLOSE_COLUMN").unwrap_or_else(|| DEFAULT_CLOSE_COLUMN.to_string());
        if close_column.trim().is_empty() {
            return Err(anyhow!("CLOSE_COLUMN must not be empty"));
        }

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a valid integer")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let annualization = match lookup("ANNUALIZATION_PERIODS") {
            Some(raw) if !raw.trim().is_empty() => {
                match raw
                    .trim()
                    .parse::<u32>()
                    .context("ANNUALIZATION_PERIODS must be a valid integer")?
                {
                    0 => Annualization::SampleCount,
                    periods => Annualization::Periods(periods),
                }
            }
            _ => Annualization::SampleCount,
        };

        Ok(Self {
            bind_addr,
            close_column,
            max_upload_bytes,
            annualization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, AppConfig::default().bind_addr);
        assert_eq!(config.close_column, "Close ");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.annualization, Annualization::SampleCount);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "0.0.0.0:9000"),
            ("CLOSE_COLUMN", "Adj Close"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("ANNUALIZATION_PERIODS", "252"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.close_column, "Adj Close");
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.annualization, Annualization::Periods(252));
    }

    #[test]
    fn test_zero_periods_means_sample_count() {
        let config = config_from(&[("ANNUALIZATION_PERIODS", "0")]).unwrap();
        assert_eq!(config.annualization, Annualization::SampleCount);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("BIND_ADDR", "localhost")]).is_err());
        assert!(config_from(&[("MAX_UPLOAD_BYTES", "ten")]).is_err());
        assert!(config_from(&[("ANNUALIZATION_PERIODS", "-1")]).is_err());
        assert!(config_from(&[("CLOSE_COLUMN", "  ")]).is_err());
    }
}
