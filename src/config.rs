//! Application configuration

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;
use tracing::warn;

use crate::errors::TrackerError;
use crate::proximity::DEFAULT_RADIUS_M;
use crate::tracks::{EndAnchor, Segmentation};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ingest: IngestConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
}

/// Longest accepted segmentation window, ten years
pub const MAX_WINDOW: Duration = Duration::from_secs(10 * 365 * 86_400);

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    pub ships_csv: PathBuf,
    pub ports_csv: PathBuf,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub recent_window: Duration,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub prior_window: Duration,
    #[serde(default)]
    pub end_anchor: EndAnchor,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub default_radius_m: f64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("database.max_connections", 5)?
            .set_default("server.bind_address", "0.0.0.0:8080")?
            .set_default("ingest.ships_csv", "assets/ships.csv")?
            .set_default("ingest.ports_csv", "assets/ports.csv")?
            .set_default("ingest.recent_window", 2 * 24 * 3600)?
            .set_default("ingest.prior_window", 7 * 24 * 3600)?
            .set_default("query.default_radius_m", DEFAULT_RADIUS_M)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("PORTPASSAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<(), TrackerError> {
        self.database.validate()?;
        self.ingest.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.url.trim().is_empty() {
            return Err(TrackerError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(TrackerError::ConfigurationError {
                message: "Database max_connections must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl IngestConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), TrackerError> {
        Self::validate_path("ships_csv", &self.ships_csv)?;
        Self::validate_path("ports_csv", &self.ports_csv)?;
        self.validate_windows()?;
        Ok(())
    }

    fn validate_path(key: &str, path: &Path) -> Result<(), TrackerError> {
        if path.as_os_str().is_empty() {
            return Err(TrackerError::ConfigurationError {
                message: format!("Ingest path {} cannot be empty", key),
            });
        }
        if !path.exists() {
            warn!("Ingest file {} does not exist yet", path.display());
        }
        Ok(())
    }

    fn validate_windows(&self) -> Result<(), TrackerError> {
        if self.recent_window.is_zero() {
            return Err(TrackerError::ConfigurationError {
                message: "Recent window must be greater than zero".to_string(),
            });
        }
        if self.prior_window <= self.recent_window {
            return Err(TrackerError::ConfigurationError {
                message: "Prior window must be longer than recent window".to_string(),
            });
        }
        if self.prior_window > MAX_WINDOW {
            return Err(TrackerError::ConfigurationError {
                message: format!(
                    "Prior window of {}s exceeds the maximum of {}s",
                    self.prior_window.as_secs(),
                    MAX_WINDOW.as_secs()
                ),
            });
        }
        Ok(())
    }

    /// Segmentation parameters for the track builder
    pub fn segmentation(&self) -> Result<Segmentation, TrackerError> {
        self.validate_windows()?;
        let to_delta = |window: Duration| {
            TimeDelta::from_std(window).map_err(|e| TrackerError::ConfigurationError {
                message: format!("Window out of range: {}", e),
            })
        };

        Ok(Segmentation {
            recent_window: to_delta(self.recent_window)?,
            prior_window: to_delta(self.prior_window)?,
            end_anchor: self.end_anchor,
        })
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(self.default_radius_m.is_finite() && self.default_radius_m > 0.0) {
            return Err(TrackerError::ConfigurationError {
                message: "Default radius must be a positive number of metres".to_string(),
            });
        }
        Ok(())
    }
}
