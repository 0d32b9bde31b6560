//! Structured logging initialization for the Albar server.

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard single-line format
    /// Output: `2025-01-15T10:30:45.123456Z  INFO target: message key=value`
    Full,
    /// JSON format (for production log aggregation)
    Json,
}

/// Configuration for logging behavior
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Environment filter (e.g., "info,albar=debug")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: LogFormat::Full, filter: None }
    }
}

/// Pick a format automatically: JSON for non-TTY stdout, text otherwise
pub fn auto_format() -> LogFormat {
    if std::io::stdout().is_terminal() { LogFormat::Full } else { LogFormat::Json }
}

/// Initialize structured logging with configuration
///
/// Call once at startup; a second call fails because the global subscriber
/// is already set.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = if let Some(filter) = &config.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,albar=debug"))
    };

    match config.format {
        LogFormat::Full => {
            let fmt_layer = fmt::layer().with_target(false).with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        },
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(false)
                .with_current_span(true)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        },
    }

    Ok(())
}
