//! Shared library for the eventgate backend services
//!
//! This crate provides common functionality used across the trigger engine
//! and the operator API:
//! - Common data models (triggers, events)
//! - Error handling types
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, EtcdConfig, ServerConfig};
pub use error::{Error, Result};
pub use models::{Actor, Event, EventContext, Payload, StreamMeta, Trigger};

/// Initialize tracing subscriber for structured logging
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shared=debug,trigger_engine=debug,operator_api=debug,info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
