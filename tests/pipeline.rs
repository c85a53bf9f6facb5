use std::io::Write;

use tempfile::NamedTempFile;

use port_passage::{
    ingest::{load_ports, load_ship_tracks},
    models::VesselTrack,
    proximity::{find_vessels_near_port, ProximityResult},
    tracks::Segmentation,
};

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn ships_near_port_from_files() {
    let ships = write_csv(
        "site_name,location_latitude,location_longitude,ec_timestamp\n\
         NEAR,51.9201,4.4801,2024-03-19T08:00:00Z\n\
         FAR,53.54,9.98,2024-03-19T08:00:00Z\n\
         NEAR,52.50,3.00,2024-03-20T08:00:00Z\n\
         FAR,53.00,5.00,2024-03-20T08:00:00Z\n\
         OLD,51.9201,4.4801,2024-03-01T08:00:00Z\n\
         OLD,53.00,5.00,2024-03-20T08:00:00Z\n\
         BROKEN,,4.48,2024-03-20T08:00:00Z\n",
    );
    let ports = write_csv(
        "port_name,geo_location_latitude,geo_location_longitude\n\
         Rotterdam,51.92,4.48\n\
         Hamburg,53.54,9.98\n\
         Incomplete,,\n",
    );

    let tracks = load_ship_tracks(ships.path(), &Segmentation::default())
        .await
        .unwrap();
    let ports = load_ports(ports.path()).await.unwrap();
    assert_eq!(ports.len(), 2);

    let tracks: Vec<VesselTrack> = tracks.into_values().collect();
    let names: Vec<_> = tracks.iter().map(|t| t.vessel.as_str()).collect();
    assert_eq!(names, vec!["BROKEN", "FAR", "NEAR", "OLD"]);

    let result = find_vessels_near_port("ROTTERDAM", 1000.0, &ports, &tracks).unwrap();
    let matched: Vec<_> = result.vessels().iter().map(|t| t.vessel.as_str()).collect();
    // OLD was near Rotterdam 19 days before its last report, outside both windows
    assert_eq!(matched, vec!["NEAR"]);

    let result = find_vessels_near_port("hamburg", 1000.0, &ports, &tracks).unwrap();
    let matched: Vec<_> = result.vessels().iter().map(|t| t.vessel.as_str()).collect();
    assert_eq!(matched, vec!["FAR"]);

    let result = find_vessels_near_port("Antwerp", 1000.0, &ports, &tracks).unwrap();
    assert_eq!(result, ProximityResult::PortNotFound);
}
