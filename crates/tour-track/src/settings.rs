use clap::Parser;
use std::path::{Path, PathBuf};
use tour_track_lib::{
    COORDINATE_DECIMALS, DEFAULT_METADATA_FILE, MAX_COORDINATE_DECIMALS, PipelineConfig,
};

/// Output path that selects standard output
pub const STDOUT_PATH: &str = "-";

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Tour Track - Builds map and elevation-profile data for a multi-stage bicycle tour
pub struct Settings {
    /// Directory holding the stage metadata document and the GPX files
    #[clap(short, long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Stage metadata document, relative to the data directory unless absolute
    #[clap(short, long, value_name = "FILE", default_value = DEFAULT_METADATA_FILE)]
    pub metadata: PathBuf,

    /// Where to write the output JSON ("-" for standard output)
    #[clap(short, long, value_name = "FILE", default_value = "tour_data.json")]
    pub output: PathBuf,

    /// Decimal places kept for exported coordinates
    #[clap(
        long,
        default_value_t = COORDINATE_DECIMALS,
        value_parser = clap::value_parser!(u32).range(0..=MAX_COORDINATE_DECIMALS as i64)
    )]
    pub precision: u32,

    /// Pretty-print the output JSON
    #[clap(long, default_value = "false")]
    pub pretty: bool,
}

impl Settings {
    /// Parse settings from the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Pipeline configuration for these settings
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            metadata_file: self.metadata.clone(),
            coordinate_precision: self.precision,
        }
    }

    /// Output file, or `None` for standard output
    pub fn output_path(&self) -> Option<&Path> {
        (self.output != Path::new(STDOUT_PATH)).then_some(self.output.as_path())
    }
}
