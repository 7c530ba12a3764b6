//! Error types for connection-registry

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Legacy `key=value` destination used a key other than `host`
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("cannot stat {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl ConnectionError {
    pub fn filesystem(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
