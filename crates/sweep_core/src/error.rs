use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading configuration from a defaults file, the environment
/// or command-line overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read defaults file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: malformed assignment `{content}`", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("{origin}: invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        origin: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// A configuration or grid that must not be launched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rows to export")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
