//! End-to-end ETL run.
//!
//! Runs Init → LoadUsers → LoadCallLogs → WriteAnalytics → WriteOrderedCalls
//! against a caller-owned [`CallStore`], stopping at the first fatal error,
//! and returns a [`PipelineReport`].

use std::fmt;

use chrono::Utc;
use etl_core::error::Result;
use etl_core::models::PipelineReport;
use etl_core::settings::PipelineConfig;
use tracing::{debug, info, warn};

use crate::loader::{load_call_logs, load_users, CallLogOptions};
use crate::reports::{write_ordered_calls, write_user_analytics};
use crate::store::CallStore;

// ── Stage ─────────────────────────────────────────────────────────────────────

/// The fixed sequence of pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    LoadUsers,
    LoadCallLogs,
    WriteAnalytics,
    WriteOrderedCalls,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::LoadUsers => "load_users",
            Stage::LoadCallLogs => "load_call_logs",
            Stage::WriteAnalytics => "write_analytics",
            Stage::WriteOrderedCalls => "write_ordered_calls",
        };
        f.write_str(name)
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage against `store`.
    ///
    /// The store is left open so callers can inspect it afterwards; any
    /// error aborts the remaining stages and no later report is written.
    pub fn run(&self, store: &mut CallStore) -> Result<PipelineReport> {
        let cfg = &self.config;

        run_stage(Stage::Init, || store.init_schema())?;

        let users = run_stage(Stage::LoadUsers, || load_users(store, &cfg.users_csv))?;

        let options = CallLogOptions {
            strict: cfg.strict,
            check_references: cfg.check_references,
        };
        let call_logs = run_stage(Stage::LoadCallLogs, || {
            load_call_logs(store, &cfg.call_logs_csv, options)
        })?;

        if cfg.dump {
            dump_tables(store)?;
        }

        let analytics_rows = run_stage(Stage::WriteAnalytics, || {
            write_user_analytics(store, &cfg.analytics_csv)
        })?;
        let ordered_calls_rows = run_stage(Stage::WriteOrderedCalls, || {
            write_ordered_calls(store, &cfg.ordered_calls_csv)
        })?;

        info!(
            users = users.accepted,
            call_logs = call_logs.accepted,
            analytics_rows,
            ordered_calls_rows,
            "pipeline complete"
        );

        Ok(PipelineReport {
            generated_at: Utc::now().to_rfc3339(),
            users,
            call_logs,
            analytics_path: cfg.analytics_csv.clone(),
            analytics_rows,
            ordered_calls_path: cfg.ordered_calls_csv.clone(),
            ordered_calls_rows,
        })
    }
}

/// Open an in-memory store, run the pipeline and close the store.
///
/// The store is closed whether or not the run succeeded. A close failure is
/// logged and never masks the run's own result.
pub fn run_pipeline(config: PipelineConfig) -> Result<PipelineReport> {
    let mut store = CallStore::open_in_memory()?;
    let result = Pipeline::new(config).run(&mut store);

    match store.close() {
        Ok(()) => debug!("store closed"),
        Err(e) => warn!(error = %e, "failed to close store"),
    }

    result
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn run_stage<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    debug!(%stage, "stage started");
    f().map_err(|e| {
        warn!(%stage, error = %e, "stage failed");
        e
    })
}

/// Log every row of both tables.
fn dump_tables(store: &CallStore) -> Result<()> {
    info!("users");
    for user in store.users()? {
        info!(
            user_id = user.user_id,
            first_name = %user.first_name,
            last_name = %user.last_name,
            "user"
        );
    }

    info!("callLogs");
    for call in store.call_logs()? {
        info!(
            call_id = call.call_id,
            phone_number = %call.phone_number,
            start_time = call.start_time,
            end_time = call.end_time,
            direction = %call.direction,
            user_id = call.user_id,
            "call log"
        );
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
