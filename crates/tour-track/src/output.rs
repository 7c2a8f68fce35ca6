use std::io::Write;
use std::path::Path;
use tour_track_lib::{Result, TourOutputs};

/// Serialize the outputs as JSON
pub fn to_json(outputs: &TourOutputs, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(outputs)?
    } else {
        serde_json::to_string(outputs)?
    };
    Ok(json)
}

/// Write `contents` to `path` so that readers never see a partial file
///
/// The data goes to a temporary file in the same directory first and is
/// renamed over `path` once complete.
pub fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Print `contents` to standard output
pub fn write_stdout(contents: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(contents.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
