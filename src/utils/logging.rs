//! Tracing subscriber setup

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::{Error, Result};

/// Filter directive for the crate at `level`
pub fn filter_directive(level: &str) -> String {
    format!("docsign={}", level.to_ascii_lowercase())
}

/// Installs the global compact subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set tracing subscriber: {}", e)))
}
