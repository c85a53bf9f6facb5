//! Track segmentation
//!
//! Reports are grouped per vessel, ordered by time and split into two
//! trailing windows anchored at the vessel's end timestamp. Consecutive
//! reports with identical coordinates are collapsed into one route point.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::{PositionReport, RoutePoint, ShipRow, VesselName, VesselTrack};

/// How the window boundary `end` is chosen for a vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndAnchor {
    /// `end` is the latest report timestamp of the vessel
    #[default]
    LatestReport,
    /// `end` is the timestamp of the first report seen for the vessel in
    /// input order. Depends on file order; kept for compatibility with
    /// data sets produced by the legacy importer.
    FirstSeen,
}

/// Window widths and anchoring for track segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmentation {
    pub recent_window: TimeDelta,
    pub prior_window: TimeDelta,
    pub end_anchor: EndAnchor,
}

impl Default for Segmentation {
    fn default() -> Self {
        Self {
            recent_window: TimeDelta::days(2),
            prior_window: TimeDelta::days(7),
            end_anchor: EndAnchor::default(),
        }
    }
}

#[derive(Debug, Default)]
struct VesselReports {
    first_seen: Option<DateTime<Utc>>,
    reports: Vec<(DateTime<Utc>, RoutePoint)>,
}

/// Accumulates reports of a batch, vessel by vessel
///
/// Fold input rows into the accumulator with [`TrackAccumulator::push`] or
/// [`TrackAccumulator::push_row`], then call [`TrackAccumulator::finish`]
/// once the input is exhausted.
#[derive(Debug, Default)]
pub struct TrackAccumulator {
    segmentation: Segmentation,
    vessels: BTreeMap<VesselName, VesselReports>,
    skipped: usize,
}

impl TrackAccumulator {
    pub fn new(segmentation: Segmentation) -> Self {
        Self {
            segmentation,
            vessels: BTreeMap::new(),
            skipped: 0,
        }
    }

    /// Add a parsed report. Reports without a finite position are dropped,
    /// but still register their vessel.
    pub fn push(&mut self, report: PositionReport) {
        let position = report.position();
        let finite = report.has_finite_position();
        let entry = self.vessels.entry(report.vessel).or_default();

        if !finite {
            warn!(
                "Skipping report at {} due to non-finite position ({}, {})",
                report.timestamp, position.lon, position.lat
            );
            self.skipped += 1;
            return;
        }

        entry.first_seen.get_or_insert(report.timestamp);
        entry.reports.push((report.timestamp, position));
    }

    /// Add a raw file row. Malformed rows are logged and skipped.
    pub fn push_row(&mut self, row: ShipRow) {
        if let Some(vessel) = row
            .vessel
            .as_deref()
            .and_then(|name| VesselName::try_from(name).ok())
        {
            self.vessels.entry(vessel).or_default();
        }

        match PositionReport::try_from(row) {
            Ok(report) => self.push(report),
            Err(e) => {
                warn!("Skipping ship row: {}", e);
                self.skipped += 1;
            }
        }
    }

    /// Number of rows dropped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Segment every vessel seen so far
    pub fn finish(self) -> BTreeMap<VesselName, VesselTrack> {
        let segmentation = self.segmentation;
        debug!(
            "Segmenting {} vessels, {} rows skipped",
            self.vessels.len(),
            self.skipped
        );

        self.vessels
            .into_iter()
            .map(|(vessel, reports)| {
                let track = segment(vessel.clone(), reports, &segmentation);
                (vessel, track)
            })
            .collect()
    }
}

/// Build tracks for every vessel in a batch of reports
pub fn build_tracks<I>(
    reports: I,
    segmentation: &Segmentation,
) -> BTreeMap<VesselName, VesselTrack>
where
    I: IntoIterator<Item = PositionReport>,
{
    reports
        .into_iter()
        .fold(TrackAccumulator::new(*segmentation), |mut acc, report| {
            acc.push(report);
            acc
        })
        .finish()
}

/// Start of the window ending at `end`, clamped to the earliest representable instant
fn window_start(end: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    end.checked_sub_signed(window).unwrap_or_else(|| {
        debug!("Window of {} before {} underflows, clamping", window, end);
        DateTime::<Utc>::MIN_UTC
    })
}

fn segment(
    vessel: VesselName,
    mut vessel_reports: VesselReports,
    segmentation: &Segmentation,
) -> VesselTrack {
    let mut track = VesselTrack::empty(vessel);

    let end = match segmentation.end_anchor {
        EndAnchor::LatestReport => vessel_reports.reports.iter().map(|(t, _)| *t).max(),
        EndAnchor::FirstSeen => vessel_reports.first_seen,
    };
    let Some(end) = end else {
        return track;
    };

    let recent_start = window_start(end, segmentation.recent_window);
    let prior_start = window_start(end, segmentation.prior_window);

    // Stable, so equal timestamps keep their input order
    vessel_reports.reports.sort_by_key(|(timestamp, _)| *timestamp);

    // One cursor across both windows: a point equal to the last report
    // considered is dropped even when that report fell in the other window.
    let mut cursor: Option<RoutePoint> = None;
    for (timestamp, point) in vessel_reports.reports {
        let moved = cursor != Some(point);
        if moved && timestamp >= recent_start && timestamp < end {
            track.recent_segment.push(point);
        } else if moved && timestamp >= prior_start && timestamp < recent_start {
            track.prior_segment.push(point);
        }
        cursor = Some(point);
    }

    track
}
