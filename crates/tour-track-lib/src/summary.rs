//! Stage and tour summaries
//!
//! All figures are rounded to the nearest integer with ties to even. Ascent
//! sums every non-negative elevation delta and descent every non-positive one,
//! so a zero delta is seen by both sums.

use crate::utils::round_half_even;
use crate::{Result, StageMetadataSet, StageRow, TourError, TourTable};
use serde::Serialize;
use serde::ser::SerializeMap;

/// Key of the whole-tour entry in a serialized [`TourSummary`]
pub const TOTAL_KEY: &str = "Total";

/// Key of the stage order list in a serialized [`TourSummary`]
pub const STAGE_ORDER_KEY: &str = "stage_order";

/// Distance, climbing and elevation range of a stage (or of the whole tour)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    /// `None` for the whole-tour entry
    pub stage_no: Option<i64>,
    pub start_label: String,
    pub finish_label: String,
    pub distance_km: u64,
    pub ascent_m: u64,
    pub descent_m: u64,
    /// `None` when no point of the stage has an elevation
    pub min_elevation_m: Option<i64>,
    pub max_elevation_m: Option<i64>,
}

/// Summaries of every stage plus the whole tour
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TourSummary {
    /// `(stage_key, summary)` in tour order
    pub stages: Vec<(String, StageSummary)>,
    pub total: StageSummary,
}

impl TourSummary {
    /// Summary of one stage, or of the tour for [`TOTAL_KEY`]
    pub fn get(&self, key: &str) -> Option<&StageSummary> {
        if key == TOTAL_KEY {
            return Some(&self.total);
        }
        self.stages
            .iter()
            .find(|(stage_key, _)| stage_key == key)
            .map(|(_, summary)| summary)
    }

    /// Stage keys in tour order
    pub fn stage_order(&self) -> Vec<&str> {
        self.stages.iter().map(|(key, _)| key.as_str()).collect()
    }
}

/// Serialized as `{ <stage_key>: summary, ..., "Total": summary, "stage_order": [keys] }`
impl Serialize for TourSummary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len() + 2))?;
        for (key, summary) in &self.stages {
            map.serialize_entry(key, summary)?;
        }
        map.serialize_entry(TOTAL_KEY, &self.total)?;
        map.serialize_entry(STAGE_ORDER_KEY, &self.stage_order())?;
        map.end()
    }
}

/// Raw figures before labels are attached
struct Figures {
    distance_km: u64,
    ascent_m: u64,
    descent_m: u64,
    min_elevation_m: Option<i64>,
    max_elevation_m: Option<i64>,
}

fn figures(rows: &[StageRow], cum_distance: impl Fn(&StageRow) -> f64) -> Figures {
    let mut max_distance = 0.0f64;
    let mut ascent = 0.0;
    let mut descent = 0.0;
    let mut min_elevation: Option<f64> = None;
    let mut max_elevation: Option<f64> = None;

    for row in rows {
        max_distance = max_distance.max(cum_distance(row));

        if let Some(delta) = row.elevation_delta {
            if delta >= 0.0 {
                ascent += delta;
            }
            if delta <= 0.0 {
                descent += delta;
            }
        }

        if let Some(elevation) = row.elevation() {
            min_elevation = Some(min_elevation.map_or(elevation, |m| m.min(elevation)));
            max_elevation = Some(max_elevation.map_or(elevation, |m| m.max(elevation)));
        }
    }

    Figures {
        distance_km: round_half_even(max_distance).unsigned_abs(),
        ascent_m: round_half_even(ascent).unsigned_abs(),
        descent_m: round_half_even(descent).unsigned_abs(),
        min_elevation_m: min_elevation.map(round_half_even),
        max_elevation_m: max_elevation.map(round_half_even),
    }
}

fn labelled(stage_no: Option<i64>, start: &str, finish: &str, figures: Figures) -> StageSummary {
    StageSummary {
        stage_no,
        start_label: start.to_string(),
        finish_label: finish.to_string(),
        distance_km: figures.distance_km,
        ascent_m: figures.ascent_m,
        descent_m: figures.descent_m,
        min_elevation_m: figures.min_elevation_m,
        max_elevation_m: figures.max_elevation_m,
    }
}

/// Build per-stage summaries and the whole-tour total
///
/// The total uses the tour-wide cumulative distance and takes its start label
/// from the stage with the lowest `stage_no` and its finish label from the
/// stage with the highest one.
pub fn summarize(table: &TourTable, metadata: &StageMetadataSet) -> Result<TourSummary> {
    #[cfg(feature = "profiling")]
    profiling::scope!("summary::summarize");

    let lookup = |stage_key: &str| {
        metadata.get(stage_key).ok_or_else(|| {
            TourError::Metadata(format!("no metadata for stage {stage_key:?}"))
        })
    };

    let mut stages = Vec::with_capacity(table.stages().len());
    for (span, rows) in table.iter_stages() {
        let meta = lookup(&span.stage_key)?;
        let summary = labelled(
            Some(span.stage_no),
            &meta.start_label,
            &meta.finish_label,
            figures(rows, |row| row.cum_distance),
        );
        tracing::debug!(
            "Stage {:?}: {} km, +{} m / -{} m",
            span.stage_key,
            summary.distance_km,
            summary.ascent_m,
            summary.descent_m
        );
        stages.push((span.stage_key.clone(), summary));
    }

    if table.is_empty() {
        return Err(TourError::Aggregation("cannot summarize an empty tour".to_string()));
    }
    let (Some(first), Some(last)) = (metadata.first_stage(), metadata.last_stage()) else {
        return Err(TourError::Metadata("no stages to label the tour total".to_string()));
    };
    let total = labelled(
        None,
        &first.start_label,
        &last.finish_label,
        figures(table.rows(), |row| row.total_cum_distance),
    );

    Ok(TourSummary { stages, total })
}
