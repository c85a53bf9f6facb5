//! Port ingestion

use tracing::debug;

use crate::errors::TrackerError;
use crate::models::{PortRecord, PortRow, RoutePoint};

impl TryFrom<PortRow> for PortRecord {
    type Error = TrackerError;

    fn try_from(row: PortRow) -> Result<Self, Self::Error> {
        match row {
            PortRow {
                name: Some(name),
                lat: Some(lat),
                lon: Some(lon),
            } => Ok(PortRecord::new(name, RoutePoint::new(lon, lat))),
            _ => Err(TrackerError::malformed("incomplete port row")),
        }
    }
}

/// Keep every complete port row, in input order
///
/// Rows without a name or with a missing coordinate are skipped. Ports
/// sharing a name are all kept.
pub fn ingest_ports<I>(rows: I) -> Vec<PortRecord>
where
    I: IntoIterator<Item = PortRow>,
{
    rows.into_iter()
        .filter_map(|row| match PortRecord::try_from(row) {
            Ok(port) => Some(port),
            Err(e) => {
                debug!("Skipping port row: {}", e);
                None
            }
        })
        .collect()
}
