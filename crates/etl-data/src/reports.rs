//! CSV report generation from the `callLogs` table.

use std::fs::File;
use std::path::Path;

use etl_core::error::{EtlError, Result};
use etl_core::models::{UserAnalytics, ANALYTICS_HEADER, ORDERED_CALLS_HEADER};
use serde::Serialize;
use tracing::info;

use crate::store::CallStore;

/// Write `userId,avgDuration,numCalls` for every user with at least one call.
///
/// Returns the number of data rows written.
pub fn write_user_analytics(store: &CallStore, path: &Path) -> Result<usize> {
    let rows: Vec<AnalyticsRecord> = store
        .user_analytics()?
        .iter()
        .map(AnalyticsRecord::from)
        .collect();
    write_report(path, &ANALYTICS_HEADER, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "user analytics written");
    Ok(rows.len())
}

/// Write every call log ordered by `userId`, then `startTime`.
///
/// Returns the number of data rows written.
pub fn write_ordered_calls(store: &CallStore, path: &Path) -> Result<usize> {
    let rows = store.ordered_calls()?;
    write_report(path, &ORDERED_CALLS_HEADER, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "ordered calls written");
    Ok(rows.len())
}

/// An analytics row as it appears on disk.
#[derive(Serialize)]
struct AnalyticsRecord {
    user_id: i64,
    avg_duration: String,
    num_calls: i64,
}

impl From<&UserAnalytics> for AnalyticsRecord {
    fn from(row: &UserAnalytics) -> Self {
        Self {
            user_id: row.user_id,
            avg_duration: format_float(row.avg_duration),
            num_calls: row.num_calls,
        }
    }
}

/// Render a float the way Python's `repr` does.
///
/// Always carries a fractional part or an exponent; exponents below -4 or
/// at 16 and above use `e` notation with a signed, two-digit exponent.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .and_then(|(m, e)| e.parse::<i32>().ok().map(|e| (m, e)))
        .unwrap_or((scientific.as_str(), 0));

    if (-4..16).contains(&exponent) {
        let plain = value.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// Write a fixed header followed by one serialized record per row.
///
/// Records end in CRLF, as spreadsheet tools expect.
fn write_report<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|source| EtlError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| EtlError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
