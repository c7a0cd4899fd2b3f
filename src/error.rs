// Error types shared across the crate

use thiserror::Error;

/// Failures coercing a value into the typed option record.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown window position: {0}")]
    UnknownPosition(String),

    #[error("Invalid value for option '{key}': {source}")]
    InvalidOption {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize options: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures surfaced by the host toolkit. The controller never raises on its
/// own; these only carry a native creation failure up to the caller.
#[derive(Error, Debug)]
pub enum MenubarError {
    #[error("Failed to create tray icon: {0:#}")]
    TrayCreation(#[source] anyhow::Error),

    #[error("Failed to create popup window: {0:#}")]
    WindowCreation(#[source] anyhow::Error),
}

pub type Result<T, E = MenubarError> = std::result::Result<T, E>;
