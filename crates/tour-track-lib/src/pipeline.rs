//! Pipeline entry point
//!
//! Loads the stage metadata, processes every stage and builds the three output
//! structures consumed by the visualization layer.

use crate::export::{COORDINATE_DECIMALS, to_geometry_with_precision};
use crate::{
    ElevationProfile, GeometryExport, Result, TourSummary, aggregate, elevation_profiles,
    load_stage_metadata, summarize,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default name of the stage metadata document inside the data directory
pub const DEFAULT_METADATA_FILE: &str = "stage_meta_data.json";

/// Configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding the metadata document and the track files
    pub data_dir: PathBuf,
    /// Metadata document, relative to `data_dir` unless absolute
    pub metadata_file: PathBuf,
    /// Decimal places kept for exported coordinates
    pub coordinate_precision: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new("data")
    }
}

impl PipelineConfig {
    /// Configuration reading `stage_meta_data.json` from `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            metadata_file: PathBuf::from(DEFAULT_METADATA_FILE),
            coordinate_precision: COORDINATE_DECIMALS,
        }
    }

    /// Full path of the metadata document
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    /// Directory the track paths are resolved against
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Everything the visualization layer receives from a run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TourOutputs {
    pub geojson_data: GeometryExport,
    pub elevation_data: BTreeMap<String, ElevationProfile>,
    pub stage_summary: TourSummary,
}

/// Run the whole pipeline
///
/// Any error aborts the run; no partial outputs are produced.
pub fn run(config: &PipelineConfig) -> Result<TourOutputs> {
    #[cfg(feature = "profiling")]
    profiling::scope!("pipeline::run");

    let metadata = load_stage_metadata(config.metadata_path(), config.data_dir())?;
    let table = aggregate(&metadata)?;
    let stage_summary = summarize(&table, &metadata)?;
    let geojson_data =
        to_geometry_with_precision(&table, &stage_summary, config.coordinate_precision)?;
    let elevation_data = elevation_profiles(&table);

    tracing::info!(
        "Tour {} - {}: {} km, +{} m / -{} m",
        stage_summary.total.start_label,
        stage_summary.total.finish_label,
        stage_summary.total.distance_km,
        stage_summary.total.ascent_m,
        stage_summary.total.descent_m
    );

    Ok(TourOutputs {
        geojson_data,
        elevation_data,
        stage_summary,
    })
}
