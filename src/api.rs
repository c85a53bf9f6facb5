//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    database::Database,
    errors::TrackerError,
    ingest,
    models::{PortRecord, VesselName, VesselTrack},
    proximity::{resolve_port, ProximityQuery, ProximityResult},
    tracks::Segmentation,
};

pub struct AppState {
    pub database: Database,
    pub config: AppConfig,
    pub segmentation: Segmentation,
}

impl AppState {
    pub fn new(database: Database, config: AppConfig) -> Result<Self, TrackerError> {
        let segmentation = config.ingest.segmentation()?;
        Ok(Self {
            database,
            config,
            segmentation,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct VisitedShipsParams {
    #[serde(rename = "portName")]
    pub port_name: String,
    pub radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PopulateResponse {
    pub message: String,
    pub stored: u64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors surfaced to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Tracker(TrackerError),
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        ApiError::Tracker(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Tracker(e @ TrackerError::InvalidRadius(_))
            | ApiError::Tracker(e @ TrackerError::InvalidVesselName(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Tracker(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/visited_ships", get(visited_ships))
        .route("/populate_data_ship", post(populate_ships))
        .route("/populate_data_port", post(populate_ports))
        .route("/ships", get(list_ships))
        .route("/ships/:ship_name", get(get_ship))
        .route("/ports", get(list_ports))
        .route("/ports/:search_term", get(search_port))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Vessels whose tracks pass within a radius of a port
///
/// An unknown port yields an empty list.
pub async fn visited_ships(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VisitedShipsParams>,
) -> Result<Json<Vec<VesselTrack>>, ApiError> {
    let query = ProximityQuery::new(
        params.port_name,
        params.radius.or(Some(state.config.query.default_radius_m)),
    );

    let ports = state.database.ports().await?;
    let tracks = state.database.tracks().await?;

    let result = query.run(&ports, &tracks)?;
    if let ProximityResult::PortNotFound = result {
        info!("Port {} not found", query.port_name);
    }

    Ok(Json(result.into_vessels().into_iter().cloned().collect()))
}

/// Build tracks from the configured ship file and replace stored tracks
pub async fn populate_ships(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PopulateResponse>, ApiError> {
    let tracks =
        ingest::load_ship_tracks(&state.config.ingest.ships_csv, &state.segmentation).await?;
    let stored = state.database.replace_tracks(tracks.values()).await?;

    Ok(Json(PopulateResponse {
        message: "ship data was added successfully".to_string(),
        stored,
    }))
}

/// Append ports from the configured port file
pub async fn populate_ports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PopulateResponse>, ApiError> {
    let ports = ingest::load_ports(&state.config.ingest.ports_csv).await?;
    let stored = state.database.insert_ports(&ports).await?;

    Ok(Json(PopulateResponse {
        message: "port data was added successfully".to_string(),
        stored,
    }))
}

pub async fn list_ships(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VesselName>>, ApiError> {
    Ok(Json(state.database.vessel_names().await?))
}

pub async fn get_ship(
    State(state): State<Arc<AppState>>,
    Path(ship_name): Path<String>,
) -> Result<Json<VesselTrack>, ApiError> {
    let vessel = VesselName::try_from(ship_name)?;
    state
        .database
        .track(&vessel)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ship {} not found", vessel)))
}

pub async fn list_ports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PortRecord>>, ApiError> {
    Ok(Json(state.database.ports().await?))
}

/// First port whose name contains the search term
pub async fn search_port(
    State(state): State<Arc<AppState>>,
    Path(search_term): Path<String>,
) -> Result<Json<PortRecord>, ApiError> {
    let ports = state.database.ports().await?;
    resolve_port(&search_term, &ports)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Port not found".to_string()))
}
