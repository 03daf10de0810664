//! Row validation shared by the users and call-log loaders.
//!
//! Every CSV record is classified as [`RowOutcome::Accepted`] with a typed
//! record, or [`RowOutcome::Rejected`] with the reason. Loaders decide what a
//! rejection means (skip and count, or abort in strict mode); this module
//! never fails.

use std::fmt;

use crate::models::{NewCallLog, NewUser};

/// Column names of `users.csv`, in file order.
pub const USER_COLUMNS: [&str; 2] = ["firstName", "lastName"];

/// Column names of `callLogs.csv`, in file order.
pub const CALL_LOG_COLUMNS: [&str; 5] = ["phoneNumber", "startTime", "endTime", "direction", "userId"];

// ── Outcome types ─────────────────────────────────────────────────────────────

/// Result of validating one CSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Accepted(T),
    Rejected(RejectReason),
}

impl<T> RowOutcome<T> {
    /// The accepted record, if any.
    pub fn accepted(self) -> Option<T> {
        match self {
            RowOutcome::Accepted(v) => Some(v),
            RowOutcome::Rejected(_) => None,
        }
    }
}

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The record did not have the expected number of fields.
    FieldCount { expected: usize, found: usize },
    /// The field at `index` (zero-based) was empty after trimming.
    EmptyField { index: usize },
    /// An integer column held something that does not parse as `i64`.
    InvalidInteger { field: &'static str, value: String },
    /// The call's `userId` matches no row in `users`.
    UnknownUser { user_id: i64 },
}

impl RejectReason {
    /// Stable snake_case tag used as the key in load reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::FieldCount { .. } => "field_count",
            RejectReason::EmptyField { .. } => "empty_field",
            RejectReason::InvalidInteger { .. } => "invalid_integer",
            RejectReason::UnknownUser { .. } => "unknown_user",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            RejectReason::EmptyField { index } => write!(f, "field {} is empty", index + 1),
            RejectReason::InvalidInteger { field, value } => {
                write!(f, "{field} is not an integer: {value:?}")
            }
            RejectReason::UnknownUser { user_id } => write!(f, "unknown userId {user_id}"),
        }
    }
}

// ── Validators ────────────────────────────────────────────────────────────────

/// How [`check_shape`] decides that a field is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emptiness {
    /// Only a zero-length field is empty.
    Exact,
    /// A field holding nothing but whitespace is empty too.
    Trimmed,
}

impl Emptiness {
    fn is_empty(self, field: &str) -> bool {
        match self {
            Emptiness::Exact => field.is_empty(),
            Emptiness::Trimmed => field.trim().is_empty(),
        }
    }
}

/// Check the field count and that no field is empty.
///
/// Returns `None` when the record has exactly `expected` non-empty fields.
pub fn check_shape(
    fields: &[&str],
    expected: usize,
    emptiness: Emptiness,
) -> Option<RejectReason> {
    if fields.len() != expected {
        return Some(RejectReason::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    fields
        .iter()
        .position(|f| emptiness.is_empty(f))
        .map(|index| RejectReason::EmptyField { index })
}

/// Parse an integer column, tolerating surrounding whitespace.
pub fn parse_integer(field: &'static str, value: &str) -> Result<i64, RejectReason> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| RejectReason::InvalidInteger {
            field,
            value: value.to_string(),
        })
}

/// Validate a `users.csv` record: two non-blank names, stored trimmed.
pub fn validate_user(fields: &[&str]) -> RowOutcome<NewUser> {
    if let Some(reason) = check_shape(fields, USER_COLUMNS.len(), Emptiness::Trimmed) {
        return RowOutcome::Rejected(reason);
    }
    RowOutcome::Accepted(NewUser {
        first_name: fields[0].trim().to_string(),
        last_name: fields[1].trim().to_string(),
    })
}

/// Validate a `callLogs.csv` record.
///
/// Fields only need to be non-empty; `phoneNumber` and `direction` are kept
/// verbatim, whitespace included. `startTime`, `endTime` and `userId` must
/// parse as integers.
pub fn validate_call_log(fields: &[&str]) -> RowOutcome<NewCallLog> {
    if let Some(reason) = check_shape(fields, CALL_LOG_COLUMNS.len(), Emptiness::Exact) {
        return RowOutcome::Rejected(reason);
    }

    match parse_call_log(fields) {
        Ok(call) => RowOutcome::Accepted(call),
        Err(reason) => RowOutcome::Rejected(reason),
    }
}

/// Build a [`NewCallLog`] from a five-field record whose shape is already
/// checked.
fn parse_call_log(fields: &[&str]) -> Result<NewCallLog, RejectReason> {
    Ok(NewCallLog {
        phone_number: fields[0].to_string(),
        start_time: parse_integer(CALL_LOG_COLUMNS[1], fields[1])?,
        end_time: parse_integer(CALL_LOG_COLUMNS[2], fields[2])?,
        direction: fields[3].to_string(),
        user_id: parse_integer(CALL_LOG_COLUMNS[4], fields[4])?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
