//! Chartfinder reconciles a demographic CSV export with a tree of
//! scanned clinical documents into a local SQLite index, then serves
//! patient lookups against it.

pub mod config;
pub mod db;
pub mod facesheet;
pub mod index;
pub mod ingest;
pub mod keys;
pub mod lookup;
pub mod open_file;
pub mod pipeline;
pub mod reconcile;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the binary. Library consumers install their
/// own subscriber instead.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
