use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::io::catalog::parse_catalog;
use crate::erp::catalog::merge::MergeDelta;
use crate::erp::catalog::model::RawRecord;

pub const CHANGES_A_FILE: &str = "changesA.json";
pub const CHANGES_B_FILE: &str = "changesB.json";
pub const NEW_IN_A_FILE: &str = "newInA.json";
pub const NEW_IN_B_FILE: &str = "newInB.json";

/// Delta buckets reloaded from disk as plain JSON records, ready to be sent
/// to the ERP APIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaRecords {
    pub changes_a: Vec<RawRecord>,
    pub changes_b: Vec<RawRecord>,
    pub new_in_a: Vec<RawRecord>,
    pub new_in_b: Vec<RawRecord>,
}

impl DeltaRecords {
    /// Renders the typed buckets of a freshly computed merge as records.
    pub fn from_delta(delta: &MergeDelta) -> Result<Self> {
        Ok(Self {
            changes_a: to_records(&delta.changes_a)?,
            changes_b: to_records(&delta.changes_b)?,
            new_in_a: to_records(&delta.new_in_a)?,
            new_in_b: to_records(&delta.new_in_b)?,
        })
    }
}

fn to_records<T: Serialize>(items: &[T]) -> Result<Vec<RawRecord>> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(record) => Ok(record),
            other => Err(SyncError::InvalidCatalog(format!(
                "delta entry did not serialise to an object: {other}"
            ))),
        })
        .collect()
}

/// Writes each bucket of `delta` as its own JSON document inside `dir`,
/// creating the directory when needed.
pub fn write_delta(dir: &Path, delta: &MergeDelta) -> Result<()> {
    fs::create_dir_all(dir)?;
    write_bucket(&dir.join(CHANGES_A_FILE), &delta.changes_a)?;
    write_bucket(&dir.join(CHANGES_B_FILE), &delta.changes_b)?;
    write_bucket(&dir.join(NEW_IN_A_FILE), &delta.new_in_a)?;
    write_bucket(&dir.join(NEW_IN_B_FILE), &delta.new_in_b)?;
    Ok(())
}

fn write_bucket<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let json_string = serde_json::to_string_pretty(records)?;
    fs::write(path, json_string)?;
    Ok(())
}

/// Reads the four bucket files written by [`write_delta`].
pub fn read_delta(dir: &Path) -> Result<DeltaRecords> {
    Ok(DeltaRecords {
        changes_a: read_bucket(&dir.join(CHANGES_A_FILE))?,
        changes_b: read_bucket(&dir.join(CHANGES_B_FILE))?,
        new_in_a: read_bucket(&dir.join(NEW_IN_A_FILE))?,
        new_in_b: read_bucket(&dir.join(NEW_IN_B_FILE))?,
    })
}

fn read_bucket(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(SyncError::MissingInput(path.to_path_buf()));
    }
    let source = fs::read_to_string(path)?;
    parse_catalog(serde_json::from_str(&source)?)
}
