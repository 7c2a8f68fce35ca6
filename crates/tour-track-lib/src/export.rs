//! Output structures for the map and elevation profile
//!
//! - One GeoJSON `LineString` feature per stage, in tour order
//! - One GeoJSON `Point` feature for the start and one for the finish of each stage
//! - Per-stage `(cum_distance, elevation)` arrays for the profile plot

use crate::utils::round_to;
use crate::{Result, StageRow, TourError, TourSummary, TourTable};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value, feature::Id};
use serde::Serialize;
use std::collections::BTreeMap;

/// Decimal places kept for exported coordinates
pub const COORDINATE_DECIMALS: u32 = 6;

/// Largest coordinate precision an `f64` can still represent meaningfully
pub const MAX_COORDINATE_DECIMALS: u32 = 15;

/// The two feature collections handed to the map
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeometryExport {
    /// One line per stage
    #[serde(rename = "stages")]
    pub lines: FeatureCollection,
    /// Start and finish markers
    #[serde(rename = "start_finish")]
    pub points: FeatureCollection,
}

/// Elevation profile of one stage; `x` and `y1` have equal length
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElevationProfile {
    /// Cumulative stage distance in kilometers
    pub x: Vec<f64>,
    /// Elevation in meters
    pub y1: Vec<Option<f64>>,
}

#[derive(Clone, Copy)]
enum LocationType {
    Start,
    Finish,
}

impl LocationType {
    fn as_str(self) -> &'static str {
        match self {
            LocationType::Start => "start",
            LocationType::Finish => "finish",
        }
    }
}

fn position(row: &StageRow, decimals: u32) -> Vec<f64> {
    vec![
        round_to(row.longitude(), decimals),
        round_to(row.latitude(), decimals),
    ]
}

fn feature(geometry: Value, id: Option<usize>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: id.map(|i| Id::Number(i.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Build stage lines and start/finish markers with 6-decimal coordinates
pub fn to_geometry(table: &TourTable, summary: &TourSummary) -> Result<GeometryExport> {
    to_geometry_with_precision(table, summary, COORDINATE_DECIMALS)
}

/// Build stage lines and start/finish markers
///
/// Stages are emitted in tour order. A stage without rows produces no features.
/// `decimals` above [`MAX_COORDINATE_DECIMALS`] is rejected.
pub fn to_geometry_with_precision(
    table: &TourTable,
    summary: &TourSummary,
    decimals: u32,
) -> Result<GeometryExport> {
    #[cfg(feature = "profiling")]
    profiling::scope!("export::to_geometry");

    if decimals > MAX_COORDINATE_DECIMALS {
        return Err(TourError::CoordinateConversion(format!(
            "coordinate precision {decimals} exceeds the maximum of {MAX_COORDINATE_DECIMALS} decimals"
        )));
    }

    let mut lines = Vec::with_capacity(table.stages().len());
    let mut points = Vec::with_capacity(table.stages().len() * 2);

    for (index, (span, rows)) in table.iter_stages().enumerate() {
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            tracing::warn!("Stage {:?} has no rows, skipping", span.stage_key);
            continue;
        };
        let stage = summary.get(&span.stage_key).ok_or_else(|| {
            TourError::Metadata(format!("no summary for stage {:?}", span.stage_key))
        })?;

        let mut properties = JsonObject::new();
        properties.insert("stage_key".into(), JsonValue::from(span.stage_key.as_str()));
        properties.insert(
            "tooltip".into(),
            JsonValue::from(format!(
                "{}: {} - {}, {} km",
                span.stage_key, stage.start_label, stage.finish_label, stage.distance_km
            )),
        );
        let coordinates = rows.iter().map(|row| position(row, decimals)).collect();
        lines.push(feature(Value::LineString(coordinates), Some(index), properties));

        for (location_type, row, label) in [
            (LocationType::Start, first, &stage.start_label),
            (LocationType::Finish, last, &stage.finish_label),
        ] {
            let mut properties = JsonObject::new();
            properties.insert("stage_key".into(), JsonValue::from(span.stage_key.as_str()));
            properties.insert("tooltip".into(), JsonValue::from(label.as_str()));
            properties.insert("location_type".into(), JsonValue::from(location_type.as_str()));
            points.push(feature(Value::Point(position(row, decimals)), None, properties));
        }
    }

    Ok(GeometryExport {
        lines: collection(lines),
        points: collection(points),
    })
}

/// Per-stage elevation profiles keyed by stage
pub fn elevation_profiles(table: &TourTable) -> BTreeMap<String, ElevationProfile> {
    table
        .iter_stages()
        .map(|(span, rows)| {
            let profile = ElevationProfile {
                x: rows.iter().map(|row| row.cum_distance).collect(),
                y1: rows.iter().map(StageRow::elevation).collect(),
            };
            (span.stage_key.clone(), profile)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StageMetadata, StageMetadataSet, TrackPoint, process, summarize};
    use std::path::PathBuf;

    fn single_stage() -> (TourTable, TourSummary) {
        let samples = [
            (46.1234567, 7.7654321, Some(500.0)),
            (46.13, 7.77, None),
            (46.14, 7.78, Some(520.0)),
        ];
        let points: Vec<TrackPoint> = samples
            .into_iter()
            .map(|(latitude, longitude, elevation)| TrackPoint {
                latitude,
                longitude,
                elevation,
                track_id: 0,
                segment_id: 0,
            })
            .collect();
        let table =
            TourTable::from_stage_blocks(vec![("Stage 1".to_string(), 1, process(&points))]);
        let metadata = StageMetadataSet::from_stages([StageMetadata {
            stage_key: "Stage 1".to_string(),
            stage_no: 1,
            source_file: PathBuf::from("s1.gpx"),
            name: "Day one".to_string(),
            start_label: "Zermatt".to_string(),
            finish_label: "Visp".to_string(),
        }])
        .unwrap();
        let summary = summarize(&table, &metadata).unwrap();
        (table, summary)
    }

    #[test]
    fn test_single_stage_feature_counts() {
        let (table, summary) = single_stage();
        let export = to_geometry(&table, &summary).unwrap();
        assert_eq!(export.lines.features.len(), 1);
        assert_eq!(export.points.features.len(), 2);
    }

    #[test]
    fn test_line_feature() {
        let (table, summary) = single_stage();
        let export = to_geometry(&table, &summary).unwrap();
        let line = &export.lines.features[0];

        assert_eq!(line.id, Some(Id::Number(0u64.into())));
        let Some(Geometry { value: Value::LineString(coords), .. }) = &line.geometry else {
            panic!("expected a line string");
        };
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], vec![7.765432, 46.123457]);

        let props = line.properties.as_ref().unwrap();
        assert_eq!(props["stage_key"], "Stage 1");
        let distance = summary.get("Stage 1").unwrap().distance_km;
        assert_eq!(props["tooltip"], format!("Stage 1: Zermatt - Visp, {distance} km"));
    }

    #[test]
    fn test_start_and_finish_points() {
        let (table, summary) = single_stage();
        let export = to_geometry(&table, &summary).unwrap();
        let start = &export.points.features[0];
        let finish = &export.points.features[1];

        let start_props = start.properties.as_ref().unwrap();
        assert_eq!(start_props["location_type"], "start");
        assert_eq!(start_props["tooltip"], "Zermatt");
        assert_eq!(
            start.geometry.as_ref().unwrap().value,
            Value::Point(vec![7.765432, 46.123457])
        );

        let finish_props = finish.properties.as_ref().unwrap();
        assert_eq!(finish_props["location_type"], "finish");
        assert_eq!(finish_props["tooltip"], "Visp");
        assert_eq!(
            finish.geometry.as_ref().unwrap().value,
            Value::Point(vec![7.78, 46.14])
        );
    }

    #[test]
    fn test_custom_precision() {
        let (table, summary) = single_stage();
        let export = to_geometry_with_precision(&table, &summary, 2).unwrap();
        assert_eq!(
            export.points.features[0].geometry.as_ref().unwrap().value,
            Value::Point(vec![7.77, 46.12])
        );
    }

    #[test]
    fn test_precision_out_of_range() {
        let (table, summary) = single_stage();
        let result = to_geometry_with_precision(&table, &summary, 400);
        assert!(matches!(result, Err(TourError::CoordinateConversion(_))));

        let export = to_geometry_with_precision(&table, &summary, MAX_COORDINATE_DECIMALS).unwrap();
        let value = serde_json::to_value(&export.points).unwrap();
        assert!(value["features"][0]["geometry"]["coordinates"][0].is_f64());
    }

    #[test]
    fn test_serialized_keys() {
        let (table, summary) = single_stage();
        let value = serde_json::to_value(to_geometry(&table, &summary).unwrap()).unwrap();
        assert_eq!(value["stages"]["type"], "FeatureCollection");
        assert_eq!(value["start_finish"]["features"][1]["geometry"]["type"], "Point");
    }

    #[test]
    fn test_elevation_profiles() {
        let (table, _) = single_stage();
        let profiles = elevation_profiles(&table);
        let profile = &profiles["Stage 1"];
        assert_eq!(profile.x.len(), profile.y1.len());
        assert_eq!(profile.x[0], 0.0);
        assert_eq!(profile.y1, vec![Some(500.0), None, Some(520.0)]);
    }
}
