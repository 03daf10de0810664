use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Header row of the per-user analytics report.
pub const ANALYTICS_HEADER: [&str; 3] = ["userId", "avgDuration", "numCalls"];

/// Header row of the ordered call listing.
pub const ORDERED_CALLS_HEADER: [&str; 6] = [
    "callId",
    "phoneNumber",
    "startTime",
    "endTime",
    "direction",
    "userId",
];

/// A validated users row, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Trimmed first name, never empty.
    pub first_name: String,
    /// Trimmed last name, never empty.
    pub last_name: String,
}

/// A persisted row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Surrogate key assigned by the store.
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// A validated call-log row, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCallLog {
    pub phone_number: String,
    pub start_time: i64,
    pub end_time: i64,
    pub direction: String,
    pub user_id: i64,
}

/// A persisted row of the `callLogs` table.
///
/// Field order matches [`ORDERED_CALLS_HEADER`], so the struct serializes
/// straight into a report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    /// Surrogate key assigned by the store; also the insertion order.
    pub call_id: i64,
    pub phone_number: String,
    pub start_time: i64,
    pub end_time: i64,
    /// Free text such as `IN` / `OUT`; not checked against a fixed set.
    pub direction: String,
    /// Logical reference to [`User::user_id`].
    pub user_id: i64,
}

/// One row of the analytics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub user_id: i64,
    /// Mean of `endTime - startTime` over the user's calls.
    pub avg_duration: f64,
    pub num_calls: i64,
}

/// Summary of one loader run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Path of the CSV that was loaded.
    pub source: PathBuf,
    /// Data rows seen after the header.
    pub rows_read: u64,
    /// Rows inserted into the store.
    pub accepted: u64,
    /// Rows discarded by validation.
    pub rejected: u64,
    /// Rejection counts keyed by [`crate::validation::RejectReason::kind`].
    #[serde(default)]
    pub rejections_by_reason: BTreeMap<String, u64>,
}

impl LoadReport {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn record_accepted(&mut self) {
        self.rows_read += 1;
        self.accepted += 1;
    }

    pub fn record_rejected(&mut self, kind: &str) {
        self.rows_read += 1;
        self.rejected += 1;
        *self.rejections_by_reason.entry(kind.to_string()).or_default() += 1;
    }
}

/// Everything a completed pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// RFC 3339 timestamp of when the run finished.
    pub generated_at: String,
    pub users: LoadReport,
    pub call_logs: LoadReport,
    pub analytics_path: PathBuf,
    pub analytics_rows: usize,
    pub ordered_calls_path: PathBuf,
    pub ordered_calls_rows: usize,
}
