//! # locker-server
//!
//! HTTP API for the Locker service.
//!
//! This binary provides:
//! - **Accounts**: signup with an emailed one-time code, OTP verification,
//!   existence-only signin
//! - **Records**: opaque image records attached to a user
//! - **Direct messages**: send, fetch a conversation, mark as read, list
//!   contacts
//! - **Groups**: create, add members, post and fetch group messages
//! - **SMS**: bulk texts through carrier email-to-SMS gateways

mod accounts;
mod api;
mod config;
mod error;
mod extract;
mod groups;
mod messaging;
mod notify;
mod records;
mod sms;

#[cfg(test)]
mod testing;

use tracing::info;
use tracing_subscriber::EnvFilter;

use locker_store::{MemoryStore, MongoStore, Store};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::notify::SmtpNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,locker_server=debug,locker_store=debug,tower_http=debug")
            }),
        )
        .init();

    info!("Starting Locker server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize the notifier and the document store
    // -----------------------------------------------------------------------
    let notifier = SmtpNotifier::from_config(&config);

    match config.mongo_uri.clone() {
        Some(uri) => {
            let store = MongoStore::connect(&uri, &config.mongo_db).await?;
            run(AppState::new(store, notifier, config)).await
        }
        None => {
            tracing::warn!("MONGO_URI not set, using the in-memory store (data is not persisted)");
            run(AppState::new(MemoryStore::new(), notifier, config)).await
        }
    }
}

/// Serve until the listener fails or Ctrl+C arrives.
async fn run<S: Store>(state: AppState<S, SmtpNotifier>) -> anyhow::Result<()> {
    let http_addr = state.config.http_addr;

    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
