//! Operator API for eventgate
//!
//! REST API server for trigger management, backed by the watch-driven
//! trigger mirror. The process owns the mirror lifecycle: initial load,
//! watch supervision with backoff, and shutdown.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use shared::Config;
use trigger_engine::{EtcdTriggerStore, TriggerStore};

mod handlers;
mod models;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    shared::init_tracing();

    tracing::info!("Starting Operator API...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Connect to the trigger store
    let store = Arc::new(
        EtcdTriggerStore::connect(&config.etcd)
            .await
            .context("Failed to connect to trigger store")?,
    );

    // Populate the mirror, then keep it current from the change feed
    store.load_all().await.context("Initial trigger load failed")?;
    let watch_handle = tokio::spawn(run_watch(store.clone()));

    let store_handle: handlers::StoreHandle = store.clone();
    let server_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Operator API listening on {}", server_addr);

    let server = HttpServer::new(move || {
        App::new()
            // Add request logging middleware
            .wrap(TracingLogger::default())
            // Store handle in app state
            .app_data(web::Data::new(store_handle.clone()))
            // Configure routes
            .configure(routes::configure)
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind to {}", server_addr))?
    .run();

    // Wait for either server shutdown (actix handles ctrl-c) or watch
    // supervisor failure
    let outcome = tokio::select! {
        result = server => result.context("Server error"),
        result = watch_handle => match result {
            Ok(Ok(())) => {
                tracing::warn!("Trigger watch exited cleanly (unexpected)");
                Ok(())
            }
            Ok(Err(e)) => Err(e.context("Trigger watch failed")),
            Err(e) => Err(anyhow::anyhow!("Trigger watch task panicked: {}", e)),
        },
    };

    tracing::info!("Shutting down, stopping trigger watch...");
    store.close();
    outcome
}

/// Supervise the trigger watch.
///
/// The mirror does not reconnect on its own: when the feed dies the
/// supervisor backs off, re-loads the full trigger set to close the gap
/// left while the feed was down, and watches again. After too many
/// consecutive failures the process exits so the platform can restart it.
async fn run_watch(store: Arc<EtcdTriggerStore>) -> anyhow::Result<()> {
    const MAX_CONSECUTIVE_ERRORS: u32 = 10;
    let mut consecutive_errors = 0u32;

    loop {
        match store.watch().await {
            // Cancelled via close(); we are done
            Ok(()) => return Ok(()),
            Err(e) => {
                consecutive_errors += 1;

                // Exponential backoff: min(2^errors, 60) seconds
                let backoff_secs = std::cmp::min(2u64.pow(consecutive_errors), 60);

                tracing::error!(
                    error = %format!("{:#}", e),
                    consecutive_errors = consecutive_errors,
                    backoff_secs = backoff_secs,
                    "Trigger watch failed"
                );

                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    anyhow::bail!(
                        "Trigger watch exceeded {} consecutive failures, exiting for restart",
                        MAX_CONSECUTIVE_ERRORS
                    );
                }

                tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;

                // Re-load before re-watching so changes made while the
                // feed was down are not missed
                match store.load_all().await {
                    Ok(()) => consecutive_errors = 0,
                    Err(e) => {
                        tracing::error!(
                            error = %format!("{:#}", e),
                            "Trigger reload failed, retrying watch anyway"
                        );
                    }
                }
            }
        }
    }
}
