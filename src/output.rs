//! Writes the assembled tree as one JSON document per run.

use crate::error::ScrapeError;
use crate::scrape::models::Municipality;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp suffix for output file names, filesystem-safe.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Persists `tree` under `dir` as
/// `<kind>[_<name>]_<timestamp>.json` and returns the written path.
///
/// The document is pretty-printed UTF-8 with non-ASCII characters left
/// unescaped, mirroring the in-memory tree field for field.
pub fn write_document(
    tree: &Municipality,
    kind: &str,
    dir: &Path,
) -> Result<PathBuf, ScrapeError> {
    let path = dir.join(file_name(tree, kind));
    let json = serde_json::to_string_pretty(tree)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "results written");
    Ok(path)
}

/// Derives the output file name. Municipality runs carry the entity name
/// so concurrent runs against different municipalities stay apart.
fn file_name(tree: &Municipality, kind: &str) -> String {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    if kind == "municipality" {
        format!("{kind}_{}_{timestamp}.json", tree.name)
    } else {
        format!("{kind}_{timestamp}.json")
    }
}
