mod bootstrap;

use anyhow::{Context, Result};
use etl_core::settings::Settings;
use etl_data::pipeline::run_pipeline;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("call-etl v{} starting", env!("CARGO_PKG_VERSION"));

    let config = settings.resolve(&bootstrap::default_resources_dir())?;
    tracing::info!(
        "Inputs: {}, {}",
        config.users_csv.display(),
        config.call_logs_csv.display()
    );

    match run_pipeline(config) {
        Ok(report) => {
            if settings.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        // A missing input is reported on stdout and ends the run cleanly.
        Err(e) if e.is_missing_input() => {
            println!("Error: {e}");
        }
        Err(e) => return Err(e).context("call-etl run failed"),
    }

    Ok(())
}
