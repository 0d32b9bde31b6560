//! # Albar Configuration
//!
//! CLI-first configuration for the Albar API. Uses `clap::Parser` for
//! argument parsing with environment variable fallbacks, and `bon::Builder`
//! for ergonomic test construction without CLI/env interference.
//!
//! ```no_run
//! use albar_config::{Cli, Config};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let config = cli.config;
//! config.validate().expect("invalid configuration");
//! ```
//!
//! ```no_run
//! use albar_config::Config;
//!
//! let config = Config::builder().jwt_secret("test-secret").build();
//! ```

#![deny(unsafe_code)]

use std::net::SocketAddr;

use albar_types::error::{Error, Result};
use bon::Builder;
use clap::Parser;

/// Default HTTP listen address.
const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Default log level filter string.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default email from address.
const DEFAULT_EMAIL_FROM_ADDRESS: &str = "noreply@albar.app";

/// Default email from display name.
const DEFAULT_EMAIL_FROM_NAME: &str = "Albar";

/// Default SMTP port.
const DEFAULT_EMAIL_PORT: u16 = 587;

/// Default IPFS gateway host for building public file URLs.
const DEFAULT_IPFS_GATEWAY: &str = "gateway.pinata.cloud";

/// Default Snowflake worker ID.
const DEFAULT_WORKER_ID: u16 = 1;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Automatically detect: JSON for non-TTY stdout, text otherwise.
    #[default]
    Auto,
    /// JSON structured logging (recommended for production).
    Json,
    /// Human-readable text format.
    Text,
}

/// Command-line interface for the Albar API server.
#[derive(Debug, Parser)]
#[command(name = "albard")]
#[command(version)]
pub struct Cli {
    /// Server configuration (flattened so flags appear at top level).
    #[command(flatten)]
    pub config: Config,
}

/// Configuration for the Albar API server.
///
/// All fields are configurable via CLI flags or environment variables.
/// Precedence: CLI arg > env var > default value.
///
/// Sensitive fields (`jwt_secret`, `email_password`, `pinata_api_secret`)
/// use `hide_env_values` to prevent leaking secrets in `--help` output.
#[derive(Debug, Clone, Builder, Parser)]
#[command(name = "albard")]
#[command(version)]
#[builder(on(String, into))]
pub struct Config {
    // ── Server ───────────────────────────────────────────────────────
    /// HTTP bind address.
    #[arg(long = "listen", env = "ALBAR__LISTEN", default_value = DEFAULT_LISTEN)]
    #[builder(default = default_listen())]
    pub listen: SocketAddr,

    /// Tracing-subscriber filter string (e.g., info, debug, trace).
    #[arg(long = "log-level", env = "ALBAR__LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    #[builder(default = DEFAULT_LOG_LEVEL.to_string())]
    pub log_level: String,

    /// Log output format: auto, json, or text.
    #[arg(long = "log-format", env = "ALBAR__LOG_FORMAT", value_enum, default_value = "auto")]
    #[builder(default)]
    pub log_format: LogFormat,

    /// Snowflake worker ID for this instance (distinct per instance).
    #[arg(long = "worker-id", env = "ALBAR__WORKER_ID", default_value_t = DEFAULT_WORKER_ID)]
    #[builder(default = DEFAULT_WORKER_ID)]
    pub worker_id: u16,

    // ── Auth ─────────────────────────────────────────────────────────
    /// HMAC secret for signing bearer tokens.
    #[arg(long = "jwt-secret", env = "ALBAR__JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    // ── Email (SMTP) ─────────────────────────────────────────────────
    /// SMTP host. Empty string disables email (outbound mail is logged).
    #[arg(long = "email-host", env = "ALBAR__EMAIL_HOST", default_value = "")]
    #[builder(default)]
    pub email_host: String,

    /// SMTP port.
    #[arg(long = "email-port", env = "ALBAR__EMAIL_PORT", default_value_t = DEFAULT_EMAIL_PORT)]
    #[builder(default = DEFAULT_EMAIL_PORT)]
    pub email_port: u16,

    /// SMTP username.
    #[arg(long = "email-username", env = "ALBAR__EMAIL_USERNAME")]
    pub email_username: Option<String>,

    /// SMTP password.
    #[arg(long = "email-password", env = "ALBAR__EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    /// From email address for outgoing messages.
    #[arg(long = "email-from-address", env = "ALBAR__EMAIL_FROM_ADDRESS", default_value = DEFAULT_EMAIL_FROM_ADDRESS)]
    #[builder(default = DEFAULT_EMAIL_FROM_ADDRESS.to_string())]
    pub email_from_address: String,

    /// From display name for outgoing messages.
    #[arg(long = "email-from-name", env = "ALBAR__EMAIL_FROM_NAME", default_value = DEFAULT_EMAIL_FROM_NAME)]
    #[builder(default = DEFAULT_EMAIL_FROM_NAME.to_string())]
    pub email_from_name: String,

    /// Use unencrypted SMTP (development only).
    #[arg(long = "email-insecure", env = "ALBAR__EMAIL_INSECURE", default_value_t = false)]
    #[builder(default = false)]
    pub email_insecure: bool,

    // ── IPFS (Pinata) ────────────────────────────────────────────────
    /// Pinata API key. Both key and secret empty disables pinning
    /// (uploads go to the mock uploader).
    #[arg(long = "pinata-api-key", env = "ALBAR__PINATA_API_KEY")]
    pub pinata_api_key: Option<String>,

    /// Pinata API secret.
    #[arg(long = "pinata-api-secret", env = "ALBAR__PINATA_API_SECRET", hide_env_values = true)]
    pub pinata_api_secret: Option<String>,

    /// IPFS gateway host used to build public file URLs.
    #[arg(long = "ipfs-gateway", env = "ALBAR__IPFS_GATEWAY", default_value = DEFAULT_IPFS_GATEWAY)]
    #[builder(default = DEFAULT_IPFS_GATEWAY.to_string())]
    pub ipfs_gateway: String,

    // ── Operations ───────────────────────────────────────────────────
    /// Webhook URL notified on 5xx responses. Unset disables alerting.
    #[arg(long = "alert-webhook-url", env = "ALBAR__ALERT_WEBHOOK_URL")]
    pub alert_webhook_url: Option<String>,
}

fn default_listen() -> SocketAddr {
    #[allow(clippy::expect_used)]
    DEFAULT_LISTEN.parse().expect("default listen address is valid")
}

impl Config {
    /// Validate cross-field constraints
    ///
    /// Checked once at startup, before any service is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(Error::config("jwt-secret must not be empty"));
        }

        let has_username = self.email_username.as_deref().is_some_and(|u| !u.is_empty());
        let has_password = self.email_password.as_deref().is_some_and(|p| !p.is_empty());
        if has_username != has_password {
            return Err(Error::config(
                "email-username and email-password must both be provided or both be empty",
            ));
        }

        let has_key = self.pinata_api_key.as_deref().is_some_and(|k| !k.is_empty());
        let has_secret = self.pinata_api_secret.as_deref().is_some_and(|s| !s.is_empty());
        if has_key != has_secret {
            return Err(Error::config(
                "pinata-api-key and pinata-api-secret must both be provided or both be empty",
            ));
        }

        if self.ipfs_gateway.trim().is_empty() {
            return Err(Error::config("ipfs-gateway must not be empty"));
        }

        Ok(())
    }

    /// Whether outbound SMTP is configured
    pub fn is_email_enabled(&self) -> bool {
        !self.email_host.is_empty()
    }

    /// Whether Pinata pinning is configured
    pub fn is_ipfs_enabled(&self) -> bool {
        self.pinata_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
