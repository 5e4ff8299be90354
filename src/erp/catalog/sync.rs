use std::path::Path;

use tracing::{info, instrument, warn};

use crate::erp::catalog::apply::{ApplyReport, ProductApi, apply_delta};
use crate::erp::catalog::config::SyncConfig;
use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::io::catalog::{CatalogSource, JsonFileCatalog};
use crate::erp::catalog::io::delta::{DeltaRecords, read_delta, write_delta};
use crate::erp::catalog::io::erp_api::{ErpClient, StockClient};
use crate::erp::catalog::merge::{MergeDelta, MergeOptions, Side, merge};
use crate::erp::catalog::normalize::normalize_catalog;
use crate::erp::catalog::report::{self, LogNotifier, Notifier, REPORT_FILE};
use crate::erp::catalog::stock::{self, StockReport};

/// Fetches and normalizes both catalogs, then merges them.
#[instrument(level = "info", skip_all, fields(authoritative = ?options.authoritative))]
pub fn reconcile(
    source_a: &dyn CatalogSource,
    source_b: &dyn CatalogSource,
    options: &MergeOptions,
) -> Result<MergeDelta> {
    let catalog_a = normalize_catalog(&source_a.fetch()?)?;
    let catalog_b = normalize_catalog(&source_b.fetch()?)?;
    info!(
        products_a = catalog_a.len(),
        products_b = catalog_b.len(),
        "catalogs normalized"
    );

    let delta = merge(&catalog_a, &catalog_b, options);
    info!(
        changes_a = delta.changes_a.len(),
        changes_b = delta.changes_b.len(),
        new_in_a = delta.new_in_a.len(),
        new_in_b = delta.new_in_b.len(),
        "smart merge complete"
    );
    Ok(delta)
}

/// Merges two catalog dumps and writes the delta files into `output_dir`.
#[instrument(
    level = "info",
    skip_all,
    fields(
        system_a = %system_a.display(),
        system_b = %system_b.display(),
        output = %output_dir.display()
    )
)]
pub fn reconcile_files(
    system_a: &Path,
    system_b: &Path,
    output_dir: &Path,
    options: &MergeOptions,
) -> Result<MergeDelta> {
    let delta = reconcile(
        &JsonFileCatalog::new(system_a),
        &JsonFileCatalog::new(system_b),
        options,
    )?;
    write_delta(output_dir, &delta)?;
    info!("delta files written");
    Ok(delta)
}

/// Applies a set of delta records, writes the report file into `report_dir`
/// and hands the failures to `notifier`.
///
/// Notifier errors are logged; the apply report is still returned since every
/// record has already been sent.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir.display()))]
pub fn apply_records(
    records: &DeltaRecords,
    api_a: &dyn ProductApi,
    api_b: &dyn ProductApi,
    notifier: &dyn Notifier,
    report_dir: &Path,
) -> Result<ApplyReport> {
    let applied = apply_delta(records, api_a, api_b);
    report::write_report(&report_dir.join(REPORT_FILE), &applied)?;
    if let Err(error) = report::notify_failures(&applied, notifier) {
        warn!(%error, "failure notifications incomplete");
    }

    let failures = applied.failure_count();
    if failures > 0 {
        warn!(failures, "delta applied with failures");
    } else {
        info!("delta applied");
    }
    Ok(applied)
}

/// Reloads the delta files in `dir` and applies them.
pub fn apply_saved_delta(
    dir: &Path,
    api_a: &dyn ProductApi,
    api_b: &dyn ProductApi,
    notifier: &dyn Notifier,
) -> Result<ApplyReport> {
    let records = read_delta(dir)?;
    apply_records(&records, api_a, api_b, notifier, dir)
}

/// Summary of a configured run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub delta: MergeDelta,
    /// Present when the delta was applied.
    pub applied: Option<ApplyReport>,
}

/// Runs the sync described by `config`: merge both catalogs, persist the
/// delta and, when `apply` is set, push it to both systems.
#[instrument(level = "info", skip_all, fields(run = %report::timestamp(), apply = apply))]
pub fn run(config: &SyncConfig, apply: bool) -> Result<RunOutcome> {
    info!(
        system_a = %config.system_a.name,
        system_b = %config.system_b.name,
        "starting product sync"
    );
    let delta = reconcile_files(
        &config.system_a.catalog,
        &config.system_b.catalog,
        &config.output_dir,
        &config.merge,
    )?;

    if !apply {
        return Ok(RunOutcome {
            delta,
            applied: None,
        });
    }

    let api_a = ErpClient::from_config(&config.system_a)?;
    let api_b = ErpClient::from_config(&config.system_b)?;
    let records = DeltaRecords::from_delta(&delta)?;
    let applied = apply_records(&records, &api_a, &api_b, &LogNotifier, &config.output_dir)?;

    Ok(RunOutcome {
        delta,
        applied: Some(applied),
    })
}

/// Runs the warehouse stock sync described by the `[stock]` section of
/// `config` and logs the synced lines into the output directory.
#[instrument(level = "info", skip_all, fields(run = %report::timestamp()))]
pub fn run_stock(config: &SyncConfig) -> Result<StockReport> {
    let settings = config
        .stock
        .as_ref()
        .ok_or_else(|| SyncError::StockSync("no [stock] section configured".to_string()))?;
    let (source, target) = match settings.source {
        Side::A => (&config.system_a, &config.system_b),
        Side::B => (&config.system_b, &config.system_a),
    };
    info!(from = %source.name, to = %target.name, "starting warehouse sync");

    let source_api = StockClient::new(ErpClient::from_config(source)?, settings);
    let target_api = StockClient::new(ErpClient::from_config(target)?, settings);
    let synced = stock::sync_stock(&source_api, &target_api, settings)?;

    let log = stock::write_stock_log(&config.output_dir, &synced)?;
    info!(log = %log.display(), "stock log written");
    Ok(synced)
}
