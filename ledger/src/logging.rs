//! Structured logging initialisation for processes embedding the ledger.
//!
//! `RUST_LOG` wins over the configured level when it is set. Levels accept
//! full filter directives, e.g. `"debug,hypershare_ledger=trace"`.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LedgerConfig;
use crate::LedgerError;

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Coloured lines for a terminal.
    Human,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LedgerError::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Install the process-wide tracing subscriber.
///
/// Fails if a global subscriber has already been set.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), LedgerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_level(level)?,
    };

    let result = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
    };
    result.map_err(|e| LedgerError::Config(e.to_string()))
}

/// Parse a filter directive such as `"info"` or `"warn,hypershare_ledger=debug"`.
pub(crate) fn parse_level(level: &str) -> Result<EnvFilter, LedgerError> {
    EnvFilter::try_new(level).map_err(|e| LedgerError::Config(format!("invalid log level {level:?}: {e}")))
}

/// Initialise logging from the `log_format` / `log_level` fields of a config.
pub fn init_from_config(config: &LedgerConfig) -> Result<(), LedgerError> {
    init_logging(config.log_format()?, &config.log_level)
}
