//! Ledger configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use hypershare_types::ShareUnit;

use crate::logging::LogFormat;
use crate::LedgerError;

/// Configuration for a Hypershare ledger.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Decimal places of a share: one whole share is `10^share_decimals` raw units.
    #[serde(default)]
    pub share_decimals: u32,

    /// Maximum entries accepted in one batch call. 0 disables the limit.
    #[serde(default)]
    pub max_batch_entries: usize,

    /// Where snapshots are saved and loaded.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log filter directive, e.g. "info" or "warn,hypershare_ledger=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Check that every field holds a usable value.
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.share_unit()?;
        self.log_format()?;
        crate::logging::parse_level(&self.log_level)?;
        Ok(())
    }

    /// The share unit implied by `share_decimals`.
    pub fn share_unit(&self) -> Result<ShareUnit, LedgerError> {
        ShareUnit::from_decimals(self.share_decimals).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, LedgerError> {
        self.log_format.parse()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            share_decimals: 0,
            max_batch_entries: 0,
            snapshot_path: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
