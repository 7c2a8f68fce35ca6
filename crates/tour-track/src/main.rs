//! Tour Track - command line entry point
//!
//! Loads the stage metadata and GPX files, runs the pipeline and writes the
//! `geojson_data`, `elevation_data` and `stage_summary` document. Nothing is
//! written unless the whole run succeeds.

mod logging;
mod output;
mod settings;

use settings::Settings;
use std::process::ExitCode;

#[profiling::function]
fn run(settings: &Settings) -> tour_track_lib::Result<()> {
    let config = settings.pipeline_config();
    tracing::debug!("Pipeline configuration: {:?}", config);

    let outputs = tour_track_lib::run(&config)?;
    let json = output::to_json(&outputs, settings.pretty)?;

    match settings.output_path() {
        Some(path) => output::write_atomically(path, &json),
        None => output::write_stdout(&json),
    }
}

fn main() -> ExitCode {
    logging::setup_logging();
    tracing::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let settings = Settings::from_cli();
    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
