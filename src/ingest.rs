//! CSV row sources
//!
//! A blocking reader task parses rows from a file and hands them over a
//! bounded channel. Consumers fold the rows into the track accumulator or
//! the port list as they arrive.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    errors::TrackerError,
    models::{PortRecord, PortRow, ShipRow, VesselName, VesselTrack},
    ports::ingest_ports,
    tracks::{Segmentation, TrackAccumulator},
};

const CHANNEL_CAPACITY: usize = 100;

/// Stream of deserialized rows from a CSV file
pub struct CsvRowSource<T> {
    rx: mpsc::Receiver<T>,
    handle: JoinHandle<Result<usize, TrackerError>>,
}

impl<T> CsvRowSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Open a file and start reading rows in the background
    ///
    /// Failing to open the file is an error; rows that cannot be decoded
    /// are logged and skipped by the reader.
    pub fn open(path: &Path) -> Result<Self, TrackerError> {
        info!("Opening {}", path.display());
        let file = File::open(path)?;
        let reader = csv::Reader::from_reader(BufReader::new(file));

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::task::spawn_blocking(move || Self::read_rows(reader, tx));

        Ok(Self { rx, handle })
    }

    fn read_rows(
        mut reader: csv::Reader<BufReader<File>>,
        tx: mpsc::Sender<T>,
    ) -> Result<usize, TrackerError> {
        let mut sent = 0;
        for (index, result) in reader.deserialize::<T>().enumerate() {
            match result {
                Ok(row) => {
                    tx.blocking_send(row)
                        .map_err(|_| TrackerError::ChannelError)?;
                    sent += 1;
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    // Header is line 1
                    warn!("Skipping undecodable row {}: {}", index + 2, e);
                }
            }
        }
        Ok(sent)
    }

    /// Receive next row, None once the file is exhausted
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Wait for the reader to finish, returning the number of rows read
    pub async fn finish(self) -> Result<usize, TrackerError> {
        drop(self.rx);
        self.handle
            .await
            .map_err(|e| TrackerError::IoError(std::io::Error::other(e)))?
    }
}

/// Read a ship position file and build tracks for every vessel in it
pub async fn load_ship_tracks(
    path: &Path,
    segmentation: &Segmentation,
) -> Result<BTreeMap<VesselName, VesselTrack>, TrackerError> {
    let mut source = CsvRowSource::<ShipRow>::open(path)?;
    let mut accumulator = TrackAccumulator::new(*segmentation);

    while let Some(row) = source.recv().await {
        accumulator.push_row(row);
    }
    let rows = source.finish().await?;

    info!(
        "Read {} ship rows from {}, {} skipped",
        rows,
        path.display(),
        accumulator.skipped()
    );
    Ok(accumulator.finish())
}

/// Read a port file
pub async fn load_ports(path: &Path) -> Result<Vec<PortRecord>, TrackerError> {
    let mut source = CsvRowSource::<PortRow>::open(path)?;
    let mut rows = Vec::new();

    while let Some(row) = source.recv().await {
        rows.push(row);
    }
    let read = source.finish().await?;

    let ports = ingest_ports(rows);
    info!(
        "Read {} port rows from {}, {} accepted",
        read,
        path.display(),
        ports.len()
    );
    Ok(ports)
}
