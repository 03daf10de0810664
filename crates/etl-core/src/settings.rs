use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Load users and call logs into SQLite and write call analytics reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "call-etl",
    about = "Load users and call logs into SQLite and write call analytics reports",
    version
)]
pub struct Settings {
    /// Directory holding the input and output CSV files
    #[arg(long, env = "CALL_ETL_RESOURCES")]
    pub resources_dir: Option<PathBuf>,

    /// Users input file, relative to the resources directory
    #[arg(long, default_value = "users.csv")]
    pub users_file: PathBuf,

    /// Call-log input file, relative to the resources directory
    #[arg(long, default_value = "callLogs.csv")]
    pub call_logs_file: PathBuf,

    /// Per-user analytics output file, relative to the resources directory
    #[arg(long, default_value = "userAnalytics.csv")]
    pub analytics_file: PathBuf,

    /// Ordered call listing output file, relative to the resources directory
    #[arg(long, default_value = "orderedCalls.csv")]
    pub ordered_calls_file: PathBuf,

    /// Abort the run on a non-integer timestamp or userId instead of skipping the row
    #[arg(long)]
    pub strict: bool,

    /// Reject call logs whose userId has no matching user
    #[arg(long)]
    pub check_references: bool,

    /// Log the contents of both tables after loading
    #[arg(long)]
    pub dump: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Fully resolved inputs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub users_csv: PathBuf,
    pub call_logs_csv: PathBuf,
    pub analytics_csv: PathBuf,
    pub ordered_calls_csv: PathBuf,
    /// Treat integer parse failures in call logs as fatal.
    pub strict: bool,
    /// Reject call logs that reference a missing user.
    pub check_references: bool,
    /// Log both tables once loading has finished.
    pub dump: bool,
}

impl PipelineConfig {
    /// Config with the standard file names inside `resources_dir` and every
    /// optional behaviour switched off.
    pub fn in_dir(resources_dir: &Path) -> Self {
        Self {
            users_csv: resources_dir.join("users.csv"),
            call_logs_csv: resources_dir.join("callLogs.csv"),
            analytics_csv: resources_dir.join("userAnalytics.csv"),
            ordered_calls_csv: resources_dir.join("orderedCalls.csv"),
            strict: false,
            check_references: false,
            dump: false,
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Apply the `--debug` flag on top of the parsed arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list, for tests.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Resolve file paths against the resources directory.
    ///
    /// `default_resources` is used when neither `--resources-dir` nor
    /// `CALL_ETL_RESOURCES` was given. Absolute file names are kept as-is.
    pub fn resolve(&self, default_resources: &Path) -> Result<PipelineConfig> {
        let dir = self
            .resources_dir
            .clone()
            .unwrap_or_else(|| default_resources.to_path_buf());

        if dir.exists() && !dir.is_dir() {
            return Err(EtlError::Config(format!(
                "resources path is not a directory: {}",
                dir.display()
            )));
        }

        Ok(PipelineConfig {
            users_csv: dir.join(&self.users_file),
            call_logs_csv: dir.join(&self.call_logs_file),
            analytics_csv: dir.join(&self.analytics_file),
            ordered_calls_csv: dir.join(&self.ordered_calls_file),
            strict: self.strict,
            check_references: self.check_references,
            dump: self.dump,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
