//! TourTable - all processed stages of a tour in one arena
//!
//! Every stage is parsed and processed on its own, then the stage blocks are
//! laid out back to back in ascending `stage_no` order. Each stage keeps its
//! internal point order, so the arena is the stable sort of all rows by
//! `(stage_no, position in stage)`. The tour-wide cumulative distance is
//! accumulated over that order.

use crate::{Result, StageMetadataSet, StageRow, TourError, parse_track, process};
use std::ops::Range;

/// Location of one stage's rows inside the [`TourTable`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageSpan {
    pub stage_key: String,
    pub stage_no: i64,
    /// Range of rows in [`TourTable::rows`]
    pub rows: Range<usize>,
}

/// Processed rows of every stage, in tour order
#[derive(Clone, Debug, Default)]
pub struct TourTable {
    rows: Vec<StageRow>,
    /// One span per stage, sorted by `stage_no`
    stages: Vec<StageSpan>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TourTable {
    /// Assemble a table from per-stage row blocks given in any order
    ///
    /// Rows must come straight from [`process`]; they are stamped with their
    /// stage's key and number here.
    pub fn from_stage_blocks(blocks: Vec<(String, i64, Vec<StageRow>)>) -> Self {
        let mut blocks = blocks;
        // Stable: blocks sharing a stage_no keep their given order
        blocks.sort_by_key(|(_, stage_no, _)| *stage_no);

        let capacity = blocks.iter().map(|(_, _, rows)| rows.len()).sum();
        let mut table = TourTable {
            rows: Vec::with_capacity(capacity),
            stages: Vec::with_capacity(blocks.len()),
        };

        let mut total_cum_distance = 0.0;
        for (stage_key, stage_no, rows) in blocks {
            let start = table.rows.len();
            for mut row in rows {
                total_cum_distance += row.distance;
                row.total_cum_distance = total_cum_distance;
                row.stage_key.clone_from(&stage_key);
                row.stage_no = stage_no;
                table.rows.push(row);
            }
            table.stages.push(StageSpan {
                stage_key,
                stage_no,
                rows: start..table.rows.len(),
            });
        }

        table
    }

    /// All rows in tour order
    #[inline]
    pub fn rows(&self) -> &[StageRow] {
        &self.rows
    }

    /// Stage spans in tour order
    #[inline]
    pub fn stages(&self) -> &[StageSpan] {
        &self.stages
    }

    /// Iterate `(span, rows)` pairs in tour order
    pub fn iter_stages(&self) -> impl Iterator<Item = (&StageSpan, &[StageRow])> {
        self.stages
            .iter()
            .map(|span| (span, &self.rows[span.rows.clone()]))
    }

    /// Stage keys sorted by `stage_no`
    pub fn stage_order(&self) -> Vec<String> {
        self.stages.iter().map(|span| span.stage_key.clone()).collect()
    }

    /// Tour distance in kilometers
    pub fn total_distance(&self) -> f64 {
        self.rows.last().map_or(0.0, |row| row.total_cum_distance)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse and process every stage, then combine them into a [`TourTable`]
///
/// Fails if there are no stages, if any track file cannot be parsed, or if a
/// stage's track contains no points. No partial table is ever returned.
pub fn aggregate(metadata: &StageMetadataSet) -> Result<TourTable> {
    #[cfg(feature = "profiling")]
    profiling::scope!("aggregate::aggregate");

    if metadata.is_empty() {
        return Err(TourError::Aggregation("no stages defined".to_string()));
    }

    let mut blocks = Vec::with_capacity(metadata.len());
    for stage in metadata.iter() {
        let points = parse_track(&stage.source_file)?;
        if points.is_empty() {
            return Err(TourError::Aggregation(format!(
                "stage {:?} ({}) has no track points",
                stage.stage_key,
                stage.source_file.display()
            )));
        }
        if points.iter().all(|p| p.elevation.is_none()) {
            tracing::warn!("Stage {:?} has no elevation data", stage.stage_key);
        }

        let rows = process(&points);
        tracing::debug!(
            "Processed stage {:?} (#{}, {}): {} points, {:.2} km",
            stage.stage_key,
            stage.stage_no,
            stage.name,
            rows.len(),
            rows.last().map_or(0.0, |row| row.cum_distance)
        );
        blocks.push((stage.stage_key.clone(), stage.stage_no, rows));
    }

    let table = TourTable::from_stage_blocks(blocks);
    tracing::info!(
        "Aggregated {} stages, {} points, {:.1} km",
        table.stages().len(),
        table.len(),
        table.total_distance()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    fn stage_points(base_lat: f64, n: usize) -> Vec<TrackPoint> {
        (0..n)
            .map(|i| TrackPoint {
                latitude: base_lat + i as f64 * 0.01,
                longitude: 8.0,
                elevation: Some(400.0 + i as f64),
                track_id: 0,
                segment_id: 0,
            })
            .collect()
    }

    fn reversed_tour() -> TourTable {
        TourTable::from_stage_blocks(vec![
            ("second".to_string(), 2, process(&stage_points(47.0, 3))),
            ("first".to_string(), 1, process(&stage_points(46.0, 4))),
        ])
    }

    #[test]
    fn test_stages_sorted_by_stage_no() {
        let table = reversed_tour();
        assert_eq!(table.stage_order(), vec!["first", "second"]);

        let nos: Vec<i64> = table.rows().iter().map(|r| r.stage_no).collect();
        assert_eq!(nos, vec![1, 1, 1, 1, 2, 2, 2]);
        assert_eq!(table.stages()[0].rows, 0..4);
        assert_eq!(table.stages()[1].rows, 4..7);
    }

    #[test]
    fn test_total_cum_distance_continues_across_stages() {
        let table = reversed_tour();
        let rows = table.rows();
        assert!(rows.windows(2).all(|w| w[0].total_cum_distance <= w[1].total_cum_distance));

        // The first row of the second stage adds no distance
        assert_eq!(rows[4].total_cum_distance, rows[3].total_cum_distance);

        let stage_sum: f64 = table
            .iter_stages()
            .map(|(_, rows)| rows.last().unwrap().cum_distance)
            .sum();
        assert!((table.total_distance() - stage_sum).abs() < 1e-9);
    }

    #[test]
    fn test_stage_rows_keep_point_order() {
        let table = reversed_tour();
        let (_, rows) = table
            .iter_stages()
            .find(|(span, _)| span.stage_key == "second")
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].latitude(), 47.0);
        assert!((rows[2].latitude() - 47.02).abs() < 1e-9);
        assert!(rows.iter().all(|r| r.stage_key == "second"));
        assert_eq!(rows[0].cum_distance, 0.0);
    }

    #[test]
    fn test_empty_metadata_fails() {
        let err = aggregate(&StageMetadataSet::default()).unwrap_err();
        assert!(matches!(err, TourError::Aggregation(_)));
    }

    #[test]
    fn test_empty_table() {
        let table = TourTable::default();
        assert!(table.is_empty());
        assert_eq!(table.total_distance(), 0.0);
    }
}
