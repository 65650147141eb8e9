//! Balance watcher built on `chainbal`.
//!
//! Reads a TOML configuration, subscribes to the balances of a set of
//! addresses across the configured chains, and logs every update.
//!
//! # Modules
//!
//! - [`config`] - Watcher configuration with environment variable expansion
//! - [`error`] - Configuration error types
//! - [`signal`] - OS shutdown signal handling

pub mod config;
pub mod error;
pub mod signal;

pub use config::WatchConfig;
pub use error::ConfigError;
pub use signal::ShutdownSignal;
