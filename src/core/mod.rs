pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigError, EnrichConfig};
pub use error::{EnrichError, Result};
pub use types::{format_timestamp, EntityIndex, Pbgid, Timestamp};
