//! CSV loading for the `users` and `callLogs` tables.
//!
//! Each loader skips the header line, validates every record through
//! [`etl_core::validation`], inserts accepted rows inside one transaction and
//! returns a [`LoadReport`]. Rejected rows are logged at debug level and
//! counted, never raised, except integer parse failures in strict mode.

use std::fs::File;
use std::path::Path;

use etl_core::error::{EtlError, Result};
use etl_core::models::LoadReport;
use etl_core::validation::{validate_call_log, validate_user, RejectReason, RowOutcome};
use tracing::{debug, info};

use crate::store::CallStore;

/// Options controlling how call-log rows are admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLogOptions {
    /// Abort the whole load on a non-integer timestamp or userId.
    pub strict: bool,
    /// Reject rows whose `userId` is not present in `users`.
    pub check_references: bool,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load `users.csv` into the `users` table.
///
/// Rows with other than two fields, or a blank field, are discarded. Names
/// are stored trimmed and receive increasing `userId`s in file order.
pub fn load_users(store: &mut CallStore, path: &Path) -> Result<LoadReport> {
    let mut reader = open_csv(path, "User")?;
    let mut report = LoadReport::new(path);
    let batch = store.begin_load()?;

    for result in reader.records() {
        let record = result?;
        let line = record_line(&record);
        let fields: Vec<&str> = record.iter().collect();
        debug!(line, ?fields, "checking users row");

        match validate_user(&fields) {
            RowOutcome::Accepted(user) => {
                let user_id = batch.insert_user(&user)?;
                debug!(line, user_id, "user inserted");
                report.record_accepted();
            }
            RowOutcome::Rejected(reason) => {
                debug!(line, %reason, "discarding users row");
                report.record_rejected(reason.kind());
            }
        }
    }

    batch.commit()?;
    info!(
        source = %path.display(),
        accepted = report.accepted,
        rejected = report.rejected,
        "users loaded"
    );
    Ok(report)
}

/// Load `callLogs.csv` into the `callLogs` table.
///
/// A record needs five non-blank fields with integer `startTime`, `endTime`
/// and `userId`. In strict mode an unparseable integer fails the load with
/// [`EtlError::RowParse`] and nothing from the file is kept.
pub fn load_call_logs(
    store: &mut CallStore,
    path: &Path,
    options: CallLogOptions,
) -> Result<LoadReport> {
    let mut reader = open_csv(path, "Call Logs")?;
    let mut report = LoadReport::new(path);
    let batch = store.begin_load()?;

    for result in reader.records() {
        let record = result?;
        let line = record_line(&record);
        let fields: Vec<&str> = record.iter().collect();

        let outcome = match validate_call_log(&fields) {
            RowOutcome::Rejected(RejectReason::InvalidInteger { field, value }) if options.strict => {
                return Err(EtlError::RowParse { line, field, value });
            }
            RowOutcome::Accepted(call)
                if options.check_references && !batch.user_exists(call.user_id)? =>
            {
                RowOutcome::Rejected(RejectReason::UnknownUser {
                    user_id: call.user_id,
                })
            }
            other => other,
        };

        match outcome {
            RowOutcome::Accepted(call) => {
                let call_id = batch.insert_call_log(&call)?;
                debug!(line, call_id, user_id = call.user_id, "call log inserted");
                report.record_accepted();
            }
            RowOutcome::Rejected(reason) => {
                debug!(line, %reason, "discarding callLogs row");
                report.record_rejected(reason.kind());
            }
        }
    }

    batch.commit()?;
    info!(
        source = %path.display(),
        accepted = report.accepted,
        rejected = report.rejected,
        "call logs loaded"
    );
    Ok(report)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Open a CSV whose first line is a header. Field counts may vary per record
/// so that short and long rows reach validation instead of failing the read.
fn open_csv(path: &Path, kind: &'static str) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(EtlError::InputNotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| EtlError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// 1-based line number of a record in its source file.
fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
