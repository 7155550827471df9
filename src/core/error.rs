use std::path::PathBuf;
use thiserror::Error;

use crate::command::filter::FilterError;
use crate::core::config::ConfigError;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Failed to read reference data {path}: {source}")]
    DataIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse reference data {path}: {source}")]
    DataParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
