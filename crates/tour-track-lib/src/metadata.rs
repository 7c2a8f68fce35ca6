//! Stage metadata
//!
//! The tour is described by a JSON document keyed by stage:
//!
//! ```json
//! {
//!   "Stage 1": {"gpx_file": "day1.gpx", "stage_no": 1, "name": "Day 1", "start": "Basel", "finish": "Olten"}
//! }
//! ```
//!
//! `stage_no` may also be given as a numeric string.

use crate::{Result, TourError};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Description of one tour stage
#[derive(Clone, Debug, PartialEq)]
pub struct StageMetadata {
    /// Unique key of the stage (the key in the metadata document)
    pub stage_key: String,
    /// Position of the stage in the tour
    pub stage_no: i64,
    /// Track file of the stage
    pub source_file: PathBuf,
    /// Display name
    pub name: String,
    /// Place where the stage starts
    pub start_label: String,
    /// Place where the stage finishes
    pub finish_label: String,
}

/// On-disk form of a stage entry
#[derive(Deserialize)]
struct RawStage {
    gpx_file: PathBuf,
    #[serde(deserialize_with = "deserialize_stage_no")]
    stage_no: i64,
    name: String,
    start: String,
    finish: String,
}

fn deserialize_stage_no<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StageNo {
        Number(i64),
        Text(String),
    }

    match StageNo::deserialize(deserializer)? {
        StageNo::Number(n) => Ok(n),
        StageNo::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("stage_no {s:?} is not an integer"))),
    }
}

/// The validated set of stages making up a tour
///
/// Stage keys are unique and so are stage numbers.
#[derive(Clone, Debug, Default)]
pub struct StageMetadataSet {
    stages: BTreeMap<String, StageMetadata>,
}

impl StageMetadataSet {
    /// Build a set from individual stages, rejecting duplicate keys or stage numbers
    ///
    /// Duplicate stage numbers are refused even though the tour order would
    /// still be defined by a stable sort; ties would make it depend on key order.
    pub fn from_stages(stages: impl IntoIterator<Item = StageMetadata>) -> Result<Self> {
        let mut map = BTreeMap::new();
        let mut numbers = HashSet::new();
        for stage in stages {
            if !numbers.insert(stage.stage_no) {
                return Err(TourError::Metadata(format!(
                    "stage_no {} is used by more than one stage",
                    stage.stage_no
                )));
            }
            if map.contains_key(&stage.stage_key) {
                return Err(TourError::Metadata(format!(
                    "duplicate stage key {:?}",
                    stage.stage_key
                )));
            }
            map.insert(stage.stage_key.clone(), stage);
        }
        Ok(Self { stages: map })
    }

    /// Parse a metadata document, resolving track files against `data_dir`
    pub fn from_json_str(json: &str, data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let raw: BTreeMap<String, RawStage> = serde_json::from_str(json)
            .map_err(|e| TourError::Metadata(e.to_string()))?;

        Self::from_stages(raw.into_iter().map(|(stage_key, raw)| StageMetadata {
            stage_key,
            stage_no: raw.stage_no,
            source_file: data_dir.join(raw.gpx_file),
            name: raw.name,
            start_label: raw.start,
            finish_label: raw.finish,
        }))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[inline]
    pub fn get(&self, stage_key: &str) -> Option<&StageMetadata> {
        self.stages.get(stage_key)
    }

    /// Iterate stages by key
    pub fn iter(&self) -> impl Iterator<Item = &StageMetadata> {
        self.stages.values()
    }

    /// The stage with the lowest `stage_no`
    pub fn first_stage(&self) -> Option<&StageMetadata> {
        self.stages.values().min_by_key(|stage| stage.stage_no)
    }

    /// The stage with the highest `stage_no`
    pub fn last_stage(&self) -> Option<&StageMetadata> {
        self.stages.values().max_by_key(|stage| stage.stage_no)
    }
}

/// Read the stage metadata document at `path`
///
/// Relative track paths inside the document are resolved against `data_dir`.
pub fn load_stage_metadata(
    path: impl AsRef<Path>,
    data_dir: impl AsRef<Path>,
) -> Result<StageMetadataSet> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| {
        TourError::Metadata(format!("cannot read {}: {e}", path.display()))
    })?;
    let stages = StageMetadataSet::from_json_str(&json, data_dir)?;
    tracing::info!("Loaded {} stages from {}", stages.len(), path.display());
    Ok(stages)
}
