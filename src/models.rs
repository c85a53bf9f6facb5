//! Data models.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TrackerError;
use crate::geometry;
use serde_helpers::*;

/// Vessel identity as it appears in position reports
///
/// Any non-blank string. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VesselName(String);

impl TryFrom<&str> for VesselName {
    type Error = TrackerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::InvalidVesselName(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for VesselName {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<VesselName> for String {
    fn from(value: VesselName) -> Self {
        value.0
    }
}

impl VesselName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VesselName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single timestamped position observation for a vessel
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub vessel: VesselName,
    /// Latitude in WGS84 decimal degrees
    pub lat: f64,
    /// Longitude in WGS84 decimal degrees
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionReport {
    pub fn new(vessel: VesselName, lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            vessel,
            lat,
            lon,
            timestamp,
        }
    }

    pub fn has_finite_position(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    pub fn position(&self) -> RoutePoint {
        RoutePoint::new(self.lon, self.lat)
    }
}

impl TryFrom<ShipRow> for PositionReport {
    type Error = TrackerError;

    fn try_from(row: ShipRow) -> Result<Self, Self::Error> {
        let vessel = row
            .vessel
            .ok_or_else(|| TrackerError::malformed("missing vessel name"))
            .and_then(VesselName::try_from)?;
        let (lat, lon) = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(TrackerError::malformed(format!(
                    "missing latitude or longitude for {}",
                    vessel
                )))
            }
        };
        let timestamp = row
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .ok_or_else(|| {
                TrackerError::malformed(format!(
                    "unparsable timestamp {:?} for {}",
                    row.timestamp.as_deref().unwrap_or(""),
                    vessel
                ))
            })?;

        Ok(Self::new(vessel, lat, lon, timestamp))
    }
}

/// Coordinate pair, longitude first
///
/// Serialized as `[lon, lat]`. Swapping the order silently breaks every
/// distance computation downstream, so there is no constructor taking
/// latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct RoutePoint {
    pub lon: f64,
    pub lat: f64,
}

impl RoutePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for RoutePoint {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<RoutePoint> for [f64; 2] {
    fn from(point: RoutePoint) -> Self {
        [point.lon, point.lat]
    }
}

/// Segmented route of a single vessel
///
/// `recent_segment` covers `[end - recent window, end)` and `prior_segment`
/// covers `[end - prior window, end - recent window)`, both oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTrack {
    pub vessel: VesselName,
    #[serde(with = "geometry::line_string")]
    pub recent_segment: Vec<RoutePoint>,
    #[serde(with = "geometry::line_string")]
    pub prior_segment: Vec<RoutePoint>,
}

impl VesselTrack {
    pub fn empty(vessel: VesselName) -> Self {
        Self {
            vessel,
            recent_segment: Vec::new(),
            prior_segment: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recent_segment.is_empty() && self.prior_segment.is_empty()
    }

    /// All points of both segments, recent segment first
    pub fn points(&self) -> impl Iterator<Item = &RoutePoint> {
        self.recent_segment.iter().chain(self.prior_segment.iter())
    }
}

/// Named port location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "geojson::Feature", try_from = "geojson::Feature")]
pub struct PortRecord {
    pub name: String,
    pub position: RoutePoint,
}

impl PortRecord {
    pub fn new(name: impl Into<String>, position: RoutePoint) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Raw row of the ship position file
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ShipRow {
    #[serde(
        rename = "site_name",
        default,
        deserialize_with = "deserialize_trimmed_string"
    )]
    pub vessel: Option<String>,
    #[serde(
        rename = "location_latitude",
        default,
        deserialize_with = "deserialize_coordinate"
    )]
    pub lat: Option<f64>,
    #[serde(
        rename = "location_longitude",
        default,
        deserialize_with = "deserialize_coordinate"
    )]
    pub lon: Option<f64>,
    #[serde(
        rename = "ec_timestamp",
        default,
        deserialize_with = "deserialize_trimmed_string"
    )]
    pub timestamp: Option<String>,
}

/// Raw row of the port file
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct PortRow {
    #[serde(
        rename = "port_name",
        default,
        deserialize_with = "deserialize_trimmed_string"
    )]
    pub name: Option<String>,
    #[serde(
        rename = "geo_location_latitude",
        default,
        deserialize_with = "deserialize_coordinate"
    )]
    pub lat: Option<f64>,
    #[serde(
        rename = "geo_location_longitude",
        default,
        deserialize_with = "deserialize_coordinate"
    )]
    pub lon: Option<f64>,
}

/// Parse a report timestamp
///
/// Accepts RFC 3339, and `YYYY-MM-DD HH:MM:SS[.fff]` with either a space or
/// `T` separator, optionally followed by a `±HH:MM` offset. Timestamps
/// without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Custom deserializers
mod serde_helpers {
    use serde::{self, Deserialize, Deserializer};

    pub fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        let trimmed = s.trim();
        Ok(if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        })
    }

    /// Decimal degrees, None if blank, unparsable or not finite
    pub fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        Ok(s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
    }
}
