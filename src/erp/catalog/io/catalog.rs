use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::model::RawRecord;

/// Key under which the ERP product-list response nests its records.
pub const PRODUCT_LIST_KEY: &str = "product_list";

/// Supplies the raw records of one system's catalog.
pub trait CatalogSource {
    fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// Catalog stored as a JSON dump of the product-list response.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    fn fetch(&self) -> Result<Vec<RawRecord>> {
        read_catalog(&self.path)
    }
}

/// Reads a catalog dump from disk.
pub fn read_catalog(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(SyncError::MissingInput(path.to_path_buf()));
    }
    let source = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&source)?;
    parse_catalog(document)
}

/// Extracts the product records from a catalog document.
///
/// Accepts either a bare array of records or an object carrying the array
/// under `product_list`.
pub fn parse_catalog(document: Value) -> Result<Vec<RawRecord>> {
    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove(PRODUCT_LIST_KEY) {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(SyncError::InvalidCatalog(format!(
                    "'{PRODUCT_LIST_KEY}' is not an array"
                )));
            }
            None => {
                return Err(SyncError::InvalidCatalog(format!(
                    "object has no '{PRODUCT_LIST_KEY}' entry"
                )));
            }
        },
        _ => {
            return Err(SyncError::InvalidCatalog(
                "expected an array of records or an object with a product list".into(),
            ));
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| match record {
            Value::Object(record) => Ok(record),
            other => Err(SyncError::InvalidCatalog(format!(
                "record at position {position} is not an object: {other}"
            ))),
        })
        .collect()
}
