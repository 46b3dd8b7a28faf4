//! Snapshot sink
//!
//! Writes the extracted record (not the manifest) to a JSON file, one file
//! per profile.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::OutputError;
use crate::extractor::{ExtractionResult, Record};
use crate::profile::profile_id;

/// What gets persisted for one extraction
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<&'a str>,
    pub extracted_at: DateTime<Utc>,
    pub record: &'a Record,
}

impl<'a> From<&'a ExtractionResult> for Snapshot<'a> {
    fn from(result: &'a ExtractionResult) -> Self {
        Self {
            source_url: result.source_url.as_deref(),
            extracted_at: result.extracted_at,
            record: &result.record,
        }
    }
}

/// `<prefix>_<profile id>_raw.json`
pub fn snapshot_filename(prefix: &str, source_url: Option<&str>) -> String {
    let id = source_url.map_or_else(|| "unknown".to_string(), profile_id);
    format!("{prefix}_{id}_raw.json")
}

/// Write `result` as pretty JSON under `dir`, creating it if needed
pub fn save_snapshot(
    dir: &Path,
    prefix: &str,
    result: &ExtractionResult,
) -> Result<PathBuf, OutputError> {
    let json = serde_json::to_string_pretty(&Snapshot::from(result))?;

    fs::create_dir_all(dir).map_err(|source| OutputError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(snapshot_filename(prefix, result.source_url.as_deref()));
    fs::write(&path, json).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), fields = result.record.len(), "saved snapshot");
    Ok(path)
}
