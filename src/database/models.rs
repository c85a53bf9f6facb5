use geojson::Geometry;
use sqlx::types::Json;

use crate::errors::TrackerError;
use crate::geometry;
use crate::models::{PortRecord, RoutePoint, VesselName, VesselTrack};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct StoredTrack {
    pub vessel_name: String,
    pub recent_segment: Json<Geometry>,
    pub prior_segment: Json<Geometry>,
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct StoredPort {
    pub port_name: String,
    pub lon: f64,
    pub lat: f64,
}

impl TryFrom<StoredTrack> for VesselTrack {
    type Error = TrackerError;

    fn try_from(row: StoredTrack) -> Result<Self, Self::Error> {
        Ok(VesselTrack {
            vessel: VesselName::try_from(row.vessel_name)?,
            recent_segment: geometry::from_line_string(&row.recent_segment)?,
            prior_segment: geometry::from_line_string(&row.prior_segment)?,
        })
    }
}

impl From<StoredPort> for PortRecord {
    fn from(row: StoredPort) -> Self {
        PortRecord::new(row.port_name, RoutePoint::new(row.lon, row.lat))
    }
}
