pub mod csv;

pub use csv::parse_rows;

use anyhow::{Context, Result};
use std::path::Path;
use crate::core::Track;

/// Load a track from a CSV file on disk
pub fn load_track<P: AsRef<Path>>(path: P) -> Result<Track> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_rows(&text)
}
