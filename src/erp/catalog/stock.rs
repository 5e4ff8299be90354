//! Warehouse stock sync.
//!
//! Reads the stock levels of one system's warehouses and pushes them, keyed
//! by product code, into a single warehouse of the other system.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::merge::Side;
use crate::erp::catalog::model::RawRecord;
use crate::erp::catalog::normalize::product_code;
use crate::erp::catalog::report;

/// `opr_desc` the target system answers when a stock sync was accepted.
pub const SYNC_SUCCESSFUL: &str = "Sync successful";

const STOCK_LIST_KEY: &str = "stock_list";

/// `[stock]` section of the run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockConfig {
    /// System whose warehouses are read. The other system receives the stock.
    #[serde(default)]
    pub source: Side,
    pub warehouse_stock_path: String,
    pub sync_stock_path: String,
    /// Warehouse id list sent verbatim as `wh_id_list`.
    pub source_warehouses: String,
    /// Warehouse of the target system the stock is booked into.
    pub target_warehouse: String,
}

/// One stock line as the target system expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub product_code: String,
    pub amount: Value,
    pub warehouse_id: String,
}

/// Stock endpoints of one ERP system.
pub trait StockApi {
    /// Raw warehouse stock response for the given warehouse id list.
    fn warehouse_stock(&self, warehouses: &str) -> Result<Value>;
    /// Raw response to a stock sync request.
    fn sync_stock(&self, entries: &[StockEntry]) -> Result<Value>;
}

/// Result of an accepted stock sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReport {
    pub entries: Vec<StockEntry>,
    pub response: Value,
}

/// Extracts the `stock_list` records of a warehouse stock response.
pub fn stock_levels(payload: &Value) -> Result<Vec<RawRecord>> {
    let Some(Value::Array(items)) = payload.get(STOCK_LIST_KEY) else {
        return Err(SyncError::StockSync(format!(
            "warehouse stock response has no {STOCK_LIST_KEY} array"
        )));
    };
    items
        .iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(record) => Ok(record.clone()),
            _ => Err(SyncError::StockSync(format!(
                "stock line {position} is not an object"
            ))),
        })
        .collect()
}

/// Maps stock levels onto entries for `warehouse_id`. A line without an
/// amount is sent with a null amount.
pub fn prepare_stock(levels: &[RawRecord], warehouse_id: &str) -> Result<Vec<StockEntry>> {
    levels
        .iter()
        .enumerate()
        .map(|(position, level)| {
            Ok(StockEntry {
                product_code: product_code(level, position)?,
                amount: level.get("amount").cloned().unwrap_or(Value::Null),
                warehouse_id: warehouse_id.to_string(),
            })
        })
        .collect()
}

/// Accepts a sync response only when it reports [`SYNC_SUCCESSFUL`].
pub fn check_sync_response(payload: Value) -> Result<Value> {
    match payload.get("opr_desc").and_then(Value::as_str) {
        Some(SYNC_SUCCESSFUL) => Ok(payload),
        _ => Err(SyncError::StockSync(format!("target rejected stock: {payload}"))),
    }
}

/// Copies the stock of `config.source_warehouses` on `source` into
/// `config.target_warehouse` on `target`.
#[instrument(level = "info", skip_all, fields(warehouses = %config.source_warehouses))]
pub fn sync_stock(
    source: &dyn StockApi,
    target: &dyn StockApi,
    config: &StockConfig,
) -> Result<StockReport> {
    let levels = stock_levels(&source.warehouse_stock(&config.source_warehouses)?)?;
    let entries = prepare_stock(&levels, &config.target_warehouse)?;
    info!(lines = entries.len(), "stock levels read");

    let response = check_sync_response(target.sync_stock(&entries)?)?;
    info!(target_warehouse = %config.target_warehouse, "stock synced");
    Ok(StockReport { entries, response })
}

/// Writes the synced stock lines to `stock_<timestamp>.json` under `dir` and
/// returns the file path.
pub fn write_stock_log(dir: &Path, synced: &StockReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("stock_{}.json", report::timestamp()));
    fs::write(&path, serde_json::to_string_pretty(&synced.entries)?)?;
    Ok(path)
}
