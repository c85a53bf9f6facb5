//! GeoJSON encodings used for persistence and the HTTP API.
//!
//! Positions are always `[longitude, latitude]`.

use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};

use crate::errors::TrackerError;
use crate::models::{PortRecord, RoutePoint};

const PORT_NAME: &str = "port_name";

fn position(point: &RoutePoint) -> Vec<f64> {
    vec![point.lon, point.lat]
}

fn route_point(position: &[f64]) -> Result<RoutePoint, TrackerError> {
    match position {
        [lon, lat, ..] => Ok(RoutePoint::new(*lon, *lat)),
        _ => Err(TrackerError::InvalidGeometry(format!(
            "position needs two coordinates, got {}",
            position.len()
        ))),
    }
}

/// Segment as a LineString geometry
pub fn to_line_string(points: &[RoutePoint]) -> Geometry {
    Geometry::new(Value::LineString(points.iter().map(position).collect()))
}

/// Route points of a LineString geometry
pub fn from_line_string(geometry: &Geometry) -> Result<Vec<RoutePoint>, TrackerError> {
    match &geometry.value {
        Value::LineString(positions) => positions.iter().map(|p| route_point(p)).collect(),
        _ => Err(TrackerError::InvalidGeometry(
            "expected a LineString".to_string(),
        )),
    }
}

impl From<PortRecord> for Feature {
    fn from(port: PortRecord) -> Self {
        let mut properties = JsonObject::new();
        properties.insert(PORT_NAME.to_string(), JsonValue::String(port.name));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(position(&port.position)))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl TryFrom<Feature> for PortRecord {
    type Error = TrackerError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        let name = match feature.property(PORT_NAME) {
            Some(JsonValue::String(name)) => name.clone(),
            _ => {
                return Err(TrackerError::InvalidGeometry(
                    "port feature without port_name".to_string(),
                ))
            }
        };
        let position = match feature.geometry.map(|g| g.value) {
            Some(Value::Point(position)) => route_point(&position)?,
            _ => {
                return Err(TrackerError::InvalidGeometry(
                    "port feature without point geometry".to_string(),
                ))
            }
        };

        Ok(PortRecord::new(name, position))
    }
}

/// `serde(with)` adapter storing a segment as a LineString geometry
pub mod line_string {
    use geojson::Geometry;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::models::RoutePoint;

    pub fn serialize<S>(points: &[RoutePoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::to_line_string(points).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<RoutePoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let geometry = Geometry::deserialize(deserializer)?;
        super::from_line_string(&geometry).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VesselName, VesselTrack};

    #[test]
    fn segment_round_trip_is_exact() {
        let points = vec![
            RoutePoint::new(4.481234567890123, 51.92000000000001),
            RoutePoint::new(-0.1, 0.30000000000000004),
            RoutePoint::new(179.99999999999997, -89.123456789),
        ];
        let json = serde_json::to_string(&to_line_string(&points)).unwrap();
        let parsed: Geometry = serde_json::from_str(&json).unwrap();

        assert_eq!(from_line_string(&parsed).unwrap(), points);
    }

    #[test]
    fn track_encodes_segments_as_line_strings() {
        let track = VesselTrack {
            vessel: VesselName::try_from("ALPHA").unwrap(),
            recent_segment: vec![RoutePoint::new(1.0, 2.0), RoutePoint::new(3.0, 4.0)],
            prior_segment: Vec::new(),
        };

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["vessel"], "ALPHA");
        assert_eq!(value["recent_segment"]["type"], "LineString");
        assert_eq!(
            value["recent_segment"]["coordinates"],
            serde_json::json!([[1.0, 2.0], [3.0, 4.0]])
        );
        assert_eq!(value["prior_segment"]["type"], "LineString");
        assert_eq!(value["prior_segment"]["coordinates"], serde_json::json!([]));

        let parsed: VesselTrack = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, track);
    }

    #[test]
    fn line_string_rejects_other_geometry() {
        let point = Geometry::new(Value::Point(vec![1.0, 2.0]));
        assert!(matches!(
            from_line_string(&point),
            Err(TrackerError::InvalidGeometry(_))
        ));

        let short = Geometry::new(Value::LineString(vec![vec![1.0]]));
        assert!(from_line_string(&short).is_err());
    }

    #[test]
    fn port_encodes_as_point_feature() {
        let port = PortRecord::new("Rotterdam", RoutePoint::new(4.48, 51.92));

        let value = serde_json::to_value(&port).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(
            value["geometry"]["coordinates"],
            serde_json::json!([4.48, 51.92])
        );
        assert_eq!(value["properties"]["port_name"], "Rotterdam");

        let parsed: PortRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, port);
    }

    #[test]
    fn port_feature_requires_name() {
        let feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![4.48, 51.92]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(PortRecord::try_from(feature).is_err());
    }
}
