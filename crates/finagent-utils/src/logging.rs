//! Logging and tracing utilities

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Fmt,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fmt" | "text" | "pretty" => Ok(Self::Fmt),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: "log format",
                value: other.to_string(),
                expected: "fmt or json",
            }),
        }
    }
}

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    // A subscriber installed earlier (e.g. by a test harness) stays in place
    let _ = init_tracing_with(LogFormat::default());
}

/// Install the global subscriber with the given output format
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Fails if a
/// global subscriber is already set.
pub fn init_tracing_with(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (human, json) = match format {
        LogFormat::Fmt => (Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(human)
        .with(json)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" FMT ".parse::<LogFormat>().unwrap(), LogFormat::Fmt);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Fmt);

        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("fmt or json"));
    }

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing();
        assert!(init_tracing_with(LogFormat::Json).is_err());
    }
}
