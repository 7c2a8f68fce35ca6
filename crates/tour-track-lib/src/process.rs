//! Per-stage point processing
//!
//! Walks a stage's points as (previous, current) windows and derives the
//! per-point columns used by every later step.

use crate::{TrackPoint, utils};

/// One processed point of a stage
#[derive(Clone, Debug, PartialEq)]
pub struct StageRow {
    /// The source sample
    pub point: TrackPoint,
    /// Elevation change from the previous point in meters
    ///
    /// `None` for the first point of a stage, and whenever either elevation is absent.
    pub elevation_delta: Option<f64>,
    /// Distance from the previous point in kilometers
    pub distance: f64,
    /// Running distance within the stage in kilometers
    pub cum_distance: f64,
    /// Running distance over the whole tour in kilometers (set by the aggregator)
    pub total_cum_distance: f64,
    /// Web Mercator easting in meters
    pub x: f64,
    /// Web Mercator northing in meters
    pub y: f64,
    /// Key of the owning stage (set by the aggregator)
    pub stage_key: String,
    /// Tour position of the owning stage (set by the aggregator)
    pub stage_no: i64,
}

impl StageRow {
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.point.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.point.longitude
    }

    #[inline]
    pub fn elevation(&self) -> Option<f64> {
        self.point.elevation
    }
}

/// Derive distance, elevation delta and projected coordinates for a stage
///
/// The returned rows have the same order and length as `points`. Tour-level
/// fields (`total_cum_distance`, `stage_key`, `stage_no`) are left at their
/// defaults for the aggregator to fill in.
pub fn process(points: &[TrackPoint]) -> Vec<StageRow> {
    #[cfg(feature = "profiling")]
    profiling::scope!("process::process");

    let mut rows = Vec::with_capacity(points.len());
    let mut cum_distance = 0.0;
    let mut previous: Option<&TrackPoint> = None;

    for point in points {
        let distance = utils::distance_km(point.lat_lon(), previous.map(TrackPoint::lat_lon));
        cum_distance += distance;

        let elevation_delta = previous
            .and_then(|prev| prev.elevation)
            .zip(point.elevation)
            .map(|(prev, current)| current - prev);

        let projected = utils::wgs84_to_mercator(point.latitude, point.longitude);

        rows.push(StageRow {
            point: *point,
            elevation_delta,
            distance,
            cum_distance,
            total_cum_distance: 0.0,
            x: projected.x(),
            y: projected.y(),
            stage_key: String::new(),
            stage_no: 0,
        });
        previous = Some(point);
    }

    rows
}
