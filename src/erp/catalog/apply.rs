//! Applies delta buckets against the two systems' product APIs.
//!
//! Every record is its own unit of work: a failing record is recorded and
//! the phase moves on to the next one.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::erp::catalog::io::delta::DeltaRecords;
use crate::erp::catalog::model::RawRecord;

/// Opaque error payload returned for a rejected record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApiFailure(pub Value);

impl ApiFailure {
    /// Failure that did not come with a response body, such as a transport
    /// error.
    pub fn message(message: impl fmt::Display) -> Self {
        ApiFailure(serde_json::json!({ "error": message.to_string() }))
    }
}

/// Product write operations offered by one ERP system.
pub trait ProductApi {
    fn update_product(&self, record: &RawRecord) -> Result<(), ApiFailure>;
    fn add_product(&self, record: &RawRecord) -> Result<(), ApiFailure>;
}

/// One of the four apply runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    UpdateA,
    UpdateB,
    AddToA,
    AddToB,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::UpdateA => write!(f, "update-a"),
            Phase::UpdateB => write!(f, "update-b"),
            Phase::AddToA => write!(f, "add-to-a"),
            Phase::AddToB => write!(f, "add-to-b"),
        }
    }
}

/// A record the target system refused, with the error it gave.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub record: RawRecord,
    pub error: ApiFailure,
}

impl RecordFailure {
    /// Product code of the failed record, when it has one.
    pub fn code(&self) -> Option<&str> {
        self.record.get("code").and_then(Value::as_str)
    }
}

/// Outcome of a single phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub attempted: usize,
    pub failures: Vec<RecordFailure>,
}

impl PhaseReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Outcome of all four phases, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub phases: Vec<PhaseReport>,
}

impl ApplyReport {
    pub fn failure_count(&self) -> usize {
        self.phases.iter().map(|phase| phase.failures.len()).sum()
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|report| report.phase == phase)
    }
}

/// Sends every record of one bucket to `api`, collecting failures.
#[instrument(level = "info", skip(records, api), fields(record_count = records.len()))]
pub fn apply_phase(phase: Phase, records: &[RawRecord], api: &dyn ProductApi) -> PhaseReport {
    let mut failures = Vec::new();

    for record in records {
        let outcome = match phase {
            Phase::UpdateA | Phase::UpdateB => api.update_product(record),
            Phase::AddToA | Phase::AddToB => api.add_product(record),
        };

        if let Err(error) = outcome {
            let failure = RecordFailure {
                record: record.clone(),
                error,
            };
            warn!(code = failure.code().unwrap_or("<none>"), "record rejected");
            failures.push(failure);
        } else {
            let code = record.get("code").and_then(Value::as_str);
            debug!(code = code.unwrap_or("<none>"), "record applied");
        }
    }

    let report = PhaseReport {
        phase,
        attempted: records.len(),
        failures,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failures.len(),
        "phase finished"
    );
    report
}

/// Runs the four phases. A-side buckets go to `api_a`, B-side ones to
/// `api_b`; failures in one phase never prevent the others from running.
pub fn apply_delta(delta: &DeltaRecords, api_a: &dyn ProductApi, api_b: &dyn ProductApi) -> ApplyReport {
    ApplyReport {
        phases: vec![
            apply_phase(Phase::UpdateA, &delta.changes_a, api_a),
            apply_phase(Phase::UpdateB, &delta.changes_b, api_b),
            apply_phase(Phase::AddToA, &delta.new_in_a, api_a),
            apply_phase(Phase::AddToB, &delta.new_in_b, api_b),
        ],
    }
}
