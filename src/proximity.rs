//! Vessels passing near a port
//!
//! Every route point of every track is tested against a spherical cap
//! around the port. This is a linear scan over all points; an r-tree or
//! geohash index over route points would replace it for large fleets.

use crate::errors::TrackerError;
use crate::models::{PortRecord, RoutePoint, VesselName, VesselTrack};

/// Sphere radius used for distance computations, in metres
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Great-circle distance between two points in metres
pub fn haversine_distance(a: &RoutePoint, b: &RoutePoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h slightly above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

/// Port search with a radius in metres
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityQuery {
    pub port_name: String,
    pub radius: f64,
}

impl ProximityQuery {
    pub fn new(port_name: impl Into<String>, radius: Option<f64>) -> Self {
        Self {
            port_name: port_name.into(),
            radius: radius.unwrap_or(DEFAULT_RADIUS_M),
        }
    }

    pub fn run<'a>(
        &self,
        ports: &'a [PortRecord],
        tracks: &'a [VesselTrack],
    ) -> Result<ProximityResult<'a>, TrackerError> {
        find_vessels_near_port(&self.port_name, self.radius, ports, tracks)
    }
}

/// Outcome of a proximity search
#[derive(Debug, Clone, PartialEq)]
pub enum ProximityResult<'a> {
    PortNotFound,
    Matches {
        port: &'a PortRecord,
        vessels: Vec<&'a VesselTrack>,
    },
}

impl<'a> ProximityResult<'a> {
    /// Matching tracks, empty when the port was not found
    pub fn vessels(&self) -> &[&'a VesselTrack] {
        match self {
            ProximityResult::PortNotFound => &[],
            ProximityResult::Matches { vessels, .. } => vessels,
        }
    }

    pub fn vessel_names(&self) -> Vec<&'a VesselName> {
        self.vessels().iter().map(|track| &track.vessel).collect()
    }

    pub fn into_vessels(self) -> Vec<&'a VesselTrack> {
        match self {
            ProximityResult::PortNotFound => Vec::new(),
            ProximityResult::Matches { vessels, .. } => vessels,
        }
    }
}

/// Check that a radius is usable for a search
pub fn validate_radius(radius: f64) -> Result<(), TrackerError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(TrackerError::InvalidRadius(radius))
    }
}

/// Find the port a search term refers to
///
/// A port matches when its name contains the term, ignoring case. Among
/// several matches the lexicographically smallest name wins; equal names
/// keep input order.
pub fn resolve_port<'a>(query: &str, ports: &'a [PortRecord]) -> Option<&'a PortRecord> {
    // A blank query would be a substring of every name
    if query.trim().is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    ports
        .iter()
        .filter(|port| port.name.to_lowercase().contains(&needle))
        .min_by(|a, b| a.name.cmp(&b.name))
}

/// True if any point of the track lies within `radius` metres of `center`
pub fn track_within(track: &VesselTrack, center: &RoutePoint, radius: f64) -> bool {
    track
        .points()
        .any(|point| haversine_distance(point, center) <= radius)
}

/// Tracks with at least one route point within `radius` metres of the port
/// matching `port_query`
pub fn find_vessels_near_port<'a>(
    port_query: &str,
    radius: f64,
    ports: &'a [PortRecord],
    tracks: &'a [VesselTrack],
) -> Result<ProximityResult<'a>, TrackerError> {
    validate_radius(radius)?;

    let Some(port) = resolve_port(port_query, ports) else {
        return Ok(ProximityResult::PortNotFound);
    };

    let vessels = tracks
        .iter()
        .filter(|track| track_within(track, &port.position, radius))
        .collect();

    Ok(ProximityResult::Matches { port, vessels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lon: f64, lat: f64) -> RoutePoint {
        RoutePoint::new(lon, lat)
    }

    fn track(vessel: &str, recent: Vec<RoutePoint>, prior: Vec<RoutePoint>) -> VesselTrack {
        VesselTrack {
            vessel: VesselName::try_from(vessel).unwrap(),
            recent_segment: recent,
            prior_segment: prior,
        }
    }

    fn ports() -> Vec<PortRecord> {
        vec![
            PortRecord::new("Rotterdam", p(4.48, 51.92)),
            PortRecord::new("Hamburg", p(9.98, 53.54)),
        ]
    }

    #[test]
    fn haversine_known_distances() {
        assert_eq!(haversine_distance(&p(4.48, 51.92), &p(4.48, 51.92)), 0.0);

        // One degree along the equator
        let d = haversine_distance(&p(0.0, 0.0), &p(1.0, 0.0));
        assert!((d - EARTH_RADIUS_M.to_radians()).abs() < 1e-6);

        // Antipodes
        let d = haversine_distance(&p(0.0, 0.0), &p(180.0, 0.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1e-3);
    }

    #[test]
    fn haversine_handles_poles_and_antimeridian() {
        // 180 degrees of longitude apart in (lon, lat) space, ~2.2 km on the sphere
        let d = haversine_distance(&p(0.0, 89.99), &p(180.0, 89.99));
        assert!((2200.0..2300.0).contains(&d), "{}", d);

        let d = haversine_distance(&p(179.999, 0.0), &p(-179.999, 0.0));
        assert!((222.0..224.0).contains(&d), "{}", d);
    }

    #[test]
    fn rotterdam_radius_boundary() {
        let ports = ports();
        let tracks = vec![track("NEAR", vec![p(4.49, 51.93)], vec![])];

        // The point is ~1.31 km from the port
        let d = haversine_distance(&p(4.48, 51.92), &p(4.49, 51.93));
        assert!((1300.0..1320.0).contains(&d), "{}", d);

        let result = find_vessels_near_port("Rotterdam", 1500.0, &ports, &tracks).unwrap();
        assert_eq!(result.vessel_names(), vec![&tracks[0].vessel]);

        let result = find_vessels_near_port("Rotterdam", 500.0, &ports, &tracks).unwrap();
        assert!(result.vessels().is_empty());
        assert!(matches!(result, ProximityResult::Matches { .. }));

        let result = find_vessels_near_port("Rotterdam", 1000.0, &ports, &tracks).unwrap();
        assert!(result.vessels().is_empty());
    }

    #[test]
    fn boundary_distance_is_inclusive() {
        let ports = ports();
        let point = p(4.49, 51.93);
        let tracks = vec![track("EDGE", vec![], vec![point])];
        let d = haversine_distance(&point, &ports[0].position);

        let result = find_vessels_near_port("rotterdam", d, &ports, &tracks).unwrap();
        assert_eq!(result.vessels().len(), 1);
    }

    #[test]
    fn either_segment_matches() {
        let ports = ports();
        let tracks = vec![
            track("RECENT", vec![p(4.4801, 51.9201)], vec![]),
            track("PRIOR", vec![p(0.0, 0.0)], vec![p(4.4802, 51.9199)]),
            track("FAR", vec![p(9.98, 53.54)], vec![p(0.0, 0.0)]),
            track("EMPTY", vec![], vec![]),
        ];

        let result = find_vessels_near_port("ROTTER", 1000.0, &ports, &tracks).unwrap();
        let names: Vec<_> = result
            .vessel_names()
            .into_iter()
            .map(VesselName::as_str)
            .collect();
        assert_eq!(names, vec!["RECENT", "PRIOR"]);
    }

    #[test]
    fn unknown_port_is_not_an_error() {
        let ports = ports();
        let tracks = vec![track("A", vec![p(4.48, 51.92)], vec![])];

        let result = find_vessels_near_port("Singapore", 1000.0, &ports, &tracks).unwrap();
        assert_eq!(result, ProximityResult::PortNotFound);
        assert!(result.into_vessels().is_empty());
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let ports = ports();
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                find_vessels_near_port("Rotterdam", radius, &ports, &[]),
                Err(TrackerError::InvalidRadius(_))
            ));
        }
    }

    #[test]
    fn port_resolution_is_deterministic() {
        let ports = vec![
            PortRecord::new("Portsmouth", p(-1.09, 50.80)),
            PortRecord::new("Portland", p(-122.68, 45.52)),
            PortRecord::new("Portland", p(-70.26, 43.66)),
            PortRecord::new("Newport", p(-71.31, 41.49)),
        ];

        let port = resolve_port("PORTL", &ports).unwrap();
        assert_eq!(port.position, p(-122.68, 45.52));

        let port = resolve_port("port", &ports).unwrap();
        assert_eq!(port.name, "Newport");

        assert!(resolve_port("Dover", &ports).is_none());
    }

    #[test]
    fn blank_port_query_matches_nothing() {
        let ports = ports();
        let tracks = vec![track("INSIDE", vec![p(4.4801, 51.9201)], vec![])];

        assert!(resolve_port("", &ports).is_none());
        assert!(resolve_port("  \t", &ports).is_none());

        let result = find_vessels_near_port(" ", 1000.0, &ports, &tracks).unwrap();
        assert_eq!(result, ProximityResult::PortNotFound);
    }

    #[test]
    fn query_defaults_radius() {
        let ports = ports();
        let tracks = vec![
            track("INSIDE", vec![p(4.4801, 51.9201)], vec![]),
            track("OUTSIDE", vec![p(4.49, 51.93)], vec![]),
        ];

        let query = ProximityQuery::new("rotterdam", None);
        assert_eq!(query.radius, DEFAULT_RADIUS_M);

        let result = query.run(&ports, &tracks).unwrap();
        assert_eq!(result.vessel_names(), vec![&tracks[0].vessel]);

        let result = ProximityQuery::new("rotterdam", Some(2000.0))
            .run(&ports, &tracks)
            .unwrap();
        assert_eq!(result.vessels().len(), 2);
    }
}
