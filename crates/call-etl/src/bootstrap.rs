use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log-level name to an [`EnvFilter`] directive.
///
/// Accepts the upper-case names the CLI exposes; anything else is passed
/// through so that full directives such as `etl_data=debug` also work.
fn filter_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr; stdout is reserved for the missing-input
/// diagnostic and the `--json` summary. Falls back to `"info"` when the
/// level cannot be parsed.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Resources discovery ────────────────────────────────────────────────────────

/// Default `resources/` directory: two levels above this crate's manifest,
/// i.e. at the workspace root.
pub fn default_resources_dir() -> PathBuf {
    resources_dir_for(Path::new(env!("CARGO_MANIFEST_DIR")))
}

fn resources_dir_for(manifest_dir: &Path) -> PathBuf {
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .join("resources")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_maps_cli_levels() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("CRITICAL"), "error");
    }

    #[test]
    fn test_filter_directive_passes_through_directives() {
        assert_eq!(filter_directive("etl_data=trace"), "etl_data=trace");
    }

    #[test]
    fn test_resources_dir_for_two_levels_up() {
        let dir = resources_dir_for(Path::new("/repo/crates/call-etl"));
        assert_eq!(dir, PathBuf::from("/repo/resources"));
    }

    #[test]
    fn test_default_resources_dir_at_workspace_root() {
        let dir = default_resources_dir();
        assert!(dir.ends_with("resources"));
        let root = dir.parent().expect("workspace root");
        assert!(
            root.join("Cargo.toml").exists(),
            "workspace manifest must sit next to resources/"
        );
        assert!(root.join("crates").is_dir());
    }
}
