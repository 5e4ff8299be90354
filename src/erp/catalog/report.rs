use std::fs;
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use tracing::warn;

use crate::erp::catalog::apply::{ApplyReport, PhaseReport};
use crate::erp::catalog::error::Result;

/// File name of the apply report written next to the delta files.
pub const REPORT_FILE: &str = "report.json";

/// Operator channel receiving the failures of an apply phase.
pub trait Notifier {
    fn notify(&self, report: &PhaseReport) -> Result<()>;
}

/// Notifier that writes every failure to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &PhaseReport) -> Result<()> {
        for failure in &report.failures {
            warn!(
                phase = %report.phase,
                code = failure.code().unwrap_or("<none>"),
                error = %failure.error.0,
                "product sync failure"
            );
        }
        Ok(())
    }
}

/// Hands every phase that has failures to `notifier`. Phases that went
/// through cleanly are not reported.
///
/// A notifier error does not stop the remaining phases from being handed
/// over; the first error is returned once all of them were tried.
pub fn notify_failures(report: &ApplyReport, notifier: &dyn Notifier) -> Result<()> {
    let mut first_error = None;
    for phase in report.phases.iter().filter(|phase| phase.has_failures()) {
        if let Err(error) = notifier.notify(phase) {
            warn!(phase = %phase.phase, %error, "failure notification not delivered");
            first_error.get_or_insert(error);
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct PhaseSummary<'a> {
    #[serde(flatten)]
    report: &'a PhaseReport,
    succeeded: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    failure_count: usize,
    phases: Vec<PhaseSummary<'a>>,
}

/// Formats the current local time as `YYYYMMDD_HHMMSS`.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Persists a JSON summary of `report` at `path`.
pub fn write_report(path: &Path, report: &ApplyReport) -> Result<()> {
    let document = ReportDocument {
        generated_at: timestamp(),
        failure_count: report.failure_count(),
        phases: report
            .phases
            .iter()
            .map(|phase| PhaseSummary {
                report: phase,
                succeeded: phase.succeeded(),
            })
            .collect(),
    };
    let json_string = serde_json::to_string_pretty(&document)?;
    fs::write(path, json_string)?;
    Ok(())
}
