use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while building, loading or validating a [`super::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or inconsistent with another value.
    #[error("config validation: {0}")]
    Validation(String),

    /// An override variable is set but unreadable (e.g. not Unicode).
    #[error("env var {key}: {message}")]
    EnvVar { key: String, message: String },

    /// An override variable is set but does not parse as the field's type.
    #[error("env var {key}={value:?}: {message}")]
    Parse {
        key: String,
        value: String,
        message: String,
    },

    #[error("config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation(message.into())
    }
}
