//! Registry persistence
//!
//! The registry lives in a TOML file:
//!
//! ```text
//! [engine]
//! active_service = "laptop"
//!
//! [engine.service_destinations.laptop]
//! uri = "ssh://me@laptop:22/run/user/1000/podman/podman.sock"
//! identity = "/home/me/.ssh/id_ed25519"
//! ```
//!
//! Writes go to a staging file that is renamed over the target.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::registry::Registry;

/// Default registry file location
pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("containers")
        .join("connections.toml")
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read registry file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write registry file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable storage for the registry
pub trait RegistryStore {
    fn load(&self) -> Result<Registry, StoreError>;
    fn write(&self, registry: &Registry) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    engine: Registry,
}

/// Registry stored as a TOML file
#[derive(Debug, Clone)]
pub struct TomlStore {
    path: PathBuf,
}

impl TomlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegistryStore for TomlStore {
    /// A missing file is an empty registry.
    fn load(&self) -> Result<Registry, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Registry file not found, starting empty");
                return Ok(Registry::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: RegistryFile = toml::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(file.engine)
    }

    fn write(&self, registry: &Registry) -> Result<(), StoreError> {
        let file = RegistryFile {
            engine: registry.clone(),
        };
        let content = toml::to_string_pretty(&file)?;

        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let staging = self.staging_path();
        fs::write(&staging, content).map_err(write_err)?;
        if let Err(source) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(write_err(source));
        }

        info!(
            path = %self.path.display(),
            connections = registry.service_destinations.len(),
            "Registry written"
        );
        Ok(())
    }
}
