//! Postgres storage for vessel tracks and ports

mod models;

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::{error, info};

use crate::{
    config::DatabaseConfig,
    errors::TrackerError,
    geometry,
    models::{PortRecord, VesselName, VesselTrack},
};
use models::{StoredPort, StoredTrack};

/// Track and port store
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Wrap an existing pool, applying pending migrations
    pub async fn new(pool: PgPool) -> Result<Self, TrackerError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, TrackerError> {
        config.validate()?;

        info!(
            "Connecting to database, max_connections={}",
            config.max_connections
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                TrackerError::DatabaseConnectionError(e.to_string())
            })?;

        Self::new(pool).await
    }

    /// Store tracks, replacing any earlier track of the same vessel
    ///
    /// All tracks are written in one transaction.
    pub async fn replace_tracks<'a, I>(&self, tracks: I) -> Result<u64, TrackerError>
    where
        I: IntoIterator<Item = &'a VesselTrack>,
    {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for track in tracks {
            sqlx::query(
                "INSERT INTO vessel_tracks (vessel_name, recent_segment, prior_segment, updated_at)
                VALUES ($1, $2, $3, now())
                ON CONFLICT (vessel_name) DO UPDATE SET
                    recent_segment = EXCLUDED.recent_segment,
                    prior_segment = EXCLUDED.prior_segment,
                    updated_at = EXCLUDED.updated_at",
            )
            .bind(track.vessel.as_str())
            .bind(Json(geometry::to_line_string(&track.recent_segment)))
            .bind(Json(geometry::to_line_string(&track.prior_segment)))
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        info!("Stored {} vessel tracks", written);
        Ok(written)
    }

    /// Append ports. Ports are never deduplicated.
    pub async fn insert_ports(&self, ports: &[PortRecord]) -> Result<u64, TrackerError> {
        let mut tx = self.pool.begin().await?;

        for port in ports {
            sqlx::query("INSERT INTO ports (port_name, lon, lat) VALUES ($1, $2, $3)")
                .bind(&port.name)
                .bind(port.position.lon)
                .bind(port.position.lat)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Stored {} ports", ports.len());
        Ok(ports.len() as u64)
    }

    /// All tracks, ordered by vessel name
    pub async fn tracks(&self) -> Result<Vec<VesselTrack>, TrackerError> {
        let rows: Vec<StoredTrack> = sqlx::query_as(
            "SELECT vessel_name, recent_segment, prior_segment
            FROM vessel_tracks
            ORDER BY vessel_name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VesselTrack::try_from).collect()
    }

    pub async fn track(&self, vessel: &VesselName) -> Result<Option<VesselTrack>, TrackerError> {
        let row: Option<StoredTrack> = sqlx::query_as(
            "SELECT vessel_name, recent_segment, prior_segment
            FROM vessel_tracks
            WHERE vessel_name = $1",
        )
        .bind(vessel.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VesselTrack::try_from).transpose()
    }

    pub async fn vessel_names(&self) -> Result<Vec<VesselName>, TrackerError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT vessel_name FROM vessel_tracks ORDER BY vessel_name")
                .fetch_all(&self.pool)
                .await?;

        names.into_iter().map(VesselName::try_from).collect()
    }

    /// All ports in insertion order
    pub async fn ports(&self) -> Result<Vec<PortRecord>, TrackerError> {
        let rows: Vec<StoredPort> =
            sqlx::query_as("SELECT port_name, lon, lat FROM ports ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(PortRecord::from).collect())
    }
}
