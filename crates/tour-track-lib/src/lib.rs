//! Tour Track Library - Stage Processing for Multi-Day GPX Tours
//!
//! This library turns one GPX recording per tour stage into the data a map and
//! elevation-profile view needs: per-point distances and projected coordinates,
//! per-stage and whole-tour statistics, and GeoJSON geometry for every stage.
//!
//! # Architecture
//!
//! - **[`parse_track`]**: Reads a GPX file into an ordered [`TrackPoint`] sequence
//! - **[`process`]**: Derives distances, elevation deltas and Web Mercator coordinates
//! - **[`aggregate`]**: Concatenates all stages into a [`TourTable`] in tour order
//! - **[`summarize`]**: Builds a [`StageSummary`] per stage plus a whole-tour total
//! - **[`to_geometry`]** / **[`elevation_profiles`]**: Output structures for rendering
//! - **[`run`]**: The full pipeline driven by a [`PipelineConfig`]
//!
//! # Example
//!
//! ```no_run
//! use tour_track_lib::{PipelineConfig, run};
//!
//! # fn main() -> tour_track_lib::Result<()> {
//! let config = PipelineConfig::new("data");
//! let outputs = run(&config)?;
//! println!("{}", serde_json::to_string(&outputs)?);
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod export;
mod metadata;
mod pipeline;
mod process;
mod summary;
mod track;
pub mod utils;

// Public API exports
pub use aggregate::{StageSpan, TourTable, aggregate};
pub use export::{
    COORDINATE_DECIMALS, ElevationProfile, GeometryExport, MAX_COORDINATE_DECIMALS,
    elevation_profiles, to_geometry, to_geometry_with_precision,
};
pub use metadata::{StageMetadata, StageMetadataSet, load_stage_metadata};
pub use pipeline::{DEFAULT_METADATA_FILE, PipelineConfig, TourOutputs, run};
pub use process::{StageRow, process};
pub use summary::{STAGE_ORDER_KEY, StageSummary, TOTAL_KEY, TourSummary, summarize};
pub use track::{TrackPoint, parse_track, track_points};
pub use utils::{distance_km, to_mercator};

use std::path::PathBuf;

/// Error types for the tour pipeline
#[derive(Debug, thiserror::Error)]
pub enum TourError {
    #[error("failed to parse track {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: gpx::errors::GpxError,
    },

    #[error("failed to read track {path}: {source}")]
    TrackIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid stage metadata: {0}")]
    Metadata(String),

    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("Coordinate conversion error: {0}")]
    CoordinateConversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TourError {
    /// Whether this error came from reading or decoding a track file
    pub fn is_parse_error(&self) -> bool {
        matches!(self, TourError::Parse { .. } | TourError::TrackIo { .. })
    }
}

pub type Result<T> = std::result::Result<T, TourError>;
