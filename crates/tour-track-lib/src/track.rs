//! Track parsing module
//!
//! Reads GPX files into a flat, ordered sequence of [`TrackPoint`]s. Tracks,
//! segments and points are visited in file order; nothing is filtered.

use crate::{Result, TourError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One GPS sample from a track file
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters, if recorded
    pub elevation: Option<f64>,
    /// 0-based index of the track within the file
    pub track_id: usize,
    /// 0-based index of the segment within its track
    pub segment_id: usize,
}

impl TrackPoint {
    /// `(latitude, longitude)` pair used for distance computation
    #[inline]
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Parse the GPX file at `path` into an ordered point sequence
pub fn parse_track(path: impl AsRef<Path>) -> Result<Vec<TrackPoint>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("track::parse_track");

    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TourError::TrackIo {
        path: path.to_path_buf(),
        source,
    })?;
    let gpx_data = gpx::read(BufReader::new(file)).map_err(|source| TourError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let points = track_points(&gpx_data);
    tracing::info!(
        "GPX file read, {} ({} tracks, {} points)",
        path.display(),
        gpx_data.tracks.len(),
        points.len()
    );
    Ok(points)
}

/// Flatten already-parsed GPX data into track points
pub fn track_points(gpx_data: &gpx::Gpx) -> Vec<TrackPoint> {
    let capacity = gpx_data
        .tracks
        .iter()
        .flat_map(|track| &track.segments)
        .map(|segment| segment.points.len())
        .sum();
    let mut points = Vec::with_capacity(capacity);

    for (track_id, track) in gpx_data.tracks.iter().enumerate() {
        for (segment_id, segment) in track.segments.iter().enumerate() {
            points.extend(segment.points.iter().map(|waypoint| {
                let point = waypoint.point();
                TrackPoint {
                    latitude: point.y(),
                    longitude: point.x(),
                    elevation: waypoint.elevation,
                    track_id,
                    segment_id,
                }
            }));
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track, TrackSegment, Waypoint};
    use std::io::Write;

    fn create_test_waypoint(lat: f64, lon: f64, ele: Option<f64>) -> Waypoint {
        let mut waypoint = Waypoint::new(geo::Point::new(lon, lat));
        waypoint.elevation = ele;
        waypoint
    }

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();

        let mut track = Track::default();
        let mut segment = TrackSegment::default();
        segment.points.push(create_test_waypoint(51.5074, -0.1278, Some(11.0)));
        segment.points.push(create_test_waypoint(51.5076, -0.1276, None));
        track.segments.push(segment);
        let mut segment = TrackSegment::default();
        segment.points.push(create_test_waypoint(51.5078, -0.1274, Some(12.5)));
        track.segments.push(segment);
        gpx.tracks.push(track);

        let mut track = Track::default();
        let mut segment = TrackSegment::default();
        segment.points.push(create_test_waypoint(51.5080, -0.1272, Some(13.0)));
        track.segments.push(segment);
        gpx.tracks.push(track);

        gpx
    }

    #[test]
    fn test_track_points_order_and_ids() {
        let points = track_points(&create_test_gpx());
        assert_eq!(points.len(), 4);

        let ids: Vec<(usize, usize)> = points.iter().map(|p| (p.track_id, p.segment_id)).collect();
        assert_eq!(ids, vec![(0, 0), (0, 0), (0, 1), (1, 0)]);

        assert_eq!(points[0].latitude, 51.5074);
        assert_eq!(points[0].longitude, -0.1278);
        assert_eq!(points[3].latitude, 51.5080);
    }

    #[test]
    fn test_missing_elevation_passes_through() {
        let points = track_points(&create_test_gpx());
        assert_eq!(points[0].elevation, Some(11.0));
        assert_eq!(points[1].elevation, None);
    }

    #[test]
    fn test_empty_gpx_has_no_points() {
        assert!(track_points(&Gpx::default()).is_empty());
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_track("does/not/exist.gpx").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_parse_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<gpx><trk><trkseg><trkpt lat=").unwrap();

        let err = parse_track(file.path()).unwrap_err();
        assert!(matches!(err, TourError::Parse { .. }));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="46.0" lon="7.0"><ele>1000.0</ele></trkpt>
    <trkpt lat="46.001" lon="7.001"></trkpt>
  </trkseg></trk>
</gpx>"#
        )
        .unwrap();

        let points = parse_track(file.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].elevation, Some(1000.0));
        assert_eq!(points[1].elevation, None);
        assert_eq!(points[1].lat_lon(), (46.001, 7.001));
    }
}
