//! JSON writer for alignment results.

use std::fs;
use std::path::Path;

use chronalign_dtw::{WarpInfo, WarpStep};
use serde::Serialize;
use tracing::{info, instrument};

use crate::IoError;

/// Serialized form of one alignment.
#[derive(Serialize)]
struct AlignmentArtifact<'a> {
    cost: f64,
    len_x: usize,
    len_y: usize,
    path_len: usize,
    /// Steps from `(0, 0)` to the final cell.
    path: Vec<&'a WarpStep>,
}

/// Render an alignment as pretty-printed JSON, path in chronological order.
///
/// # Errors
///
/// Returns [`IoError::Serialize`] if JSON encoding fails.
pub fn alignment_json(info: &WarpInfo<f64>) -> Result<String, IoError> {
    let path: Vec<&WarpStep> = info.path().iter_chronological().collect();
    let (len_x, len_y) = path.last().map_or((0, 0), |s| (s.x + 1, s.y + 1));
    let artifact = AlignmentArtifact {
        cost: info.cost(),
        len_x,
        len_y,
        path_len: path.len(),
        path,
    };
    serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize { source: e })
}

/// Write an alignment to `path` as JSON.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::Serialize`] | JSON encoding failed |
/// | [`IoError::WriteFile`] | The file cannot be written |
#[instrument(skip(info), fields(path = %path.display()))]
pub fn write_alignment(path: &Path, info: &WarpInfo<f64>) -> Result<(), IoError> {
    let json = alignment_json(info)?;
    fs::write(path, &json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(path_len = info.path().len(), "alignment written");
    Ok(())
}
