use std::sync::Arc;

use albar_api::AppState;
use albar_config::{Cli, LogFormat};
use albar_core::{
    AlertNotifier, EmailService, IdGenerator, IpfsUploader, MockAlertNotifier, MockEmailSender,
    MockIpfsUploader, PinataUploader, PrintPdfRenderer, SmtpEmailService, WebhookNotifier,
    logging,
};
use albar_storage::MemoryBackend;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config;
    config.validate()?;

    // Initialize structured logging
    let log_config = logging::LogConfig {
        format: match config.log_format {
            LogFormat::Json => logging::LogFormat::Json,
            LogFormat::Text => logging::LogFormat::Full,
            LogFormat::Auto => logging::auto_format(),
        },
        filter: Some(config.log_level.clone()),
    };
    if let Err(e) = logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Albar API");

    // Initialize the ID generator with the configured worker ID
    IdGenerator::init(config.worker_id)
        .map_err(|e| anyhow::anyhow!("Failed to initialize ID generator: {e}"))?;

    // Storage backend (in-memory; data is lost on restart)
    let storage = Arc::new(MemoryBackend::new());
    tracing::warn!("Using in-memory storage - all data is lost on restart");

    // Email service, falling back to the logging mock when unconfigured
    let email_service = if config.is_email_enabled() {
        match SmtpEmailService::new(
            &config.email_host,
            config.email_port,
            config.email_username.as_deref().unwrap_or_default(),
            config.email_password.as_deref().unwrap_or_default(),
            config.email_from_address.clone(),
            config.email_from_name.clone(),
            config.email_insecure,
        ) {
            Ok(smtp) => {
                tracing::info!(
                    host = %config.email_host,
                    port = config.email_port,
                    "Email service initialized"
                );
                Arc::new(EmailService::new(Box::new(smtp)))
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialize SMTP - outbound mail will be logged only");
                Arc::new(EmailService::new(Box::new(MockEmailSender::new())))
            },
        }
    } else {
        tracing::info!("Email not configured - outbound mail will be logged only");
        Arc::new(EmailService::new(Box::new(MockEmailSender::new())))
    };

    // IPFS uploader, mock when no Pinata credentials are present
    let ipfs: Arc<dyn IpfsUploader> = if config.is_ipfs_enabled() {
        tracing::info!(gateway = %config.ipfs_gateway, "Pinata uploader initialized");
        Arc::new(PinataUploader::new(
            config.pinata_api_key.clone().unwrap_or_default(),
            config.pinata_api_secret.clone().unwrap_or_default(),
            config.ipfs_gateway.clone(),
        ))
    } else {
        tracing::info!("Pinata not configured - uploads go to the mock uploader");
        Arc::new(MockIpfsUploader::new())
    };

    // Server-error alerting
    let notifier: Arc<dyn AlertNotifier> = match &config.alert_webhook_url {
        Some(url) => {
            tracing::info!("Alert webhook initialized");
            Arc::new(WebhookNotifier::new(url.clone()))
        },
        None => Arc::new(MockAlertNotifier::new()),
    };

    let state = AppState::new(
        storage,
        Arc::new(config),
        email_service,
        ipfs,
        Arc::new(PrintPdfRenderer::new()),
        notifier,
    );

    albar_api::serve(state).await?;

    tracing::info!("Shutting down gracefully");
    Ok(())
}
