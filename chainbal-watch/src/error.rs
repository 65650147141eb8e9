//! Error types for the balance watcher.

use chainbal::error::RegistryError;

/// Errors raised while loading the watcher configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`WatchConfig`](crate::config::WatchConfig).
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A chain or asset entry was rejected by the registry.
    #[error("registry rejected configuration: {0}")]
    Registry(#[from] RegistryError),
}
