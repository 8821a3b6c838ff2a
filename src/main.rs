use anyhow::Result;
use clap::Parser;
use fraud_tx_api::application::app::App;
use fraud_tx_api::config::Settings;
use fraud_tx_api::domain::models::SmsRelay;
use fraud_tx_api::infrastructure::json_store::JsonFileStore;
use fraud_tx_api::infrastructure::shutdown::ShutdownSignal;
use fraud_tx_api::infrastructure::twilio_relay::TwilioRelay;
use fraud_tx_api::service;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings = Settings::parse();

    let shutdown = ShutdownSignal::new();
    let relay = TwilioRelay::new(settings.relay_config());
    if relay.is_configured() {
        tracing::info!("Twilio SMS relay: configured");
    } else {
        tracing::warn!("Twilio SMS relay: not configured, SMS endpoints will fail");
    }

    // Start the API server
    let mut server_handle = if settings.in_memory {
        tracing::warn!("Running with in-memory storage, nothing will be persisted");
        let app = Arc::new(App::in_memory(relay));
        tokio::spawn(service::api::start_server(
            shutdown.clone(),
            app,
            settings.listen_port,
        ))
    } else {
        tracing::info!("Using data directory {}", settings.data_dir.display());
        let app = Arc::new(App::new(JsonFileStore::new(&settings.data_dir), relay));
        tokio::spawn(service::api::start_server(
            shutdown.clone(),
            app,
            settings.listen_port,
        ))
    };

    // Wait for shutdown signal
    let finished = tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            tracing::warn!("Received Ctrl+C, shutting down...");
            shutdown.trigger();
            None
        }
        result = &mut server_handle => Some(result),
    };

    // Wait for the server to drain
    let result = match finished {
        Some(result) => result,
        None => server_handle.await,
    };
    result??;

    tracing::info!("Shutdown complete");
    Ok(())
}
