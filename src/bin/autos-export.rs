use anyhow::{bail, Context};
use tracing::{error, info, Level};

use autos_console::config::ExportSettings;
use autos_console::dataset::read_dataset;
use autos_console::export::{run_exports, ExportJob};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let _ = dotenv::dotenv();
    let settings = ExportSettings::from_env();

    std::fs::create_dir_all(&settings.results_dir)
        .with_context(|| format!("Failed to create {}", settings.results_dir.display()))?;

    info!(dataset = %settings.dataset.display(), "Reading dataset");
    let records = read_dataset(&settings.dataset)?;

    let jobs = ExportJob::defaults(&settings.results_dir);
    let outcomes = run_exports(&records, &jobs, settings.partitions);

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_err())
        .map(|(name, _)| name.as_str())
        .collect();

    if !failed.is_empty() {
        error!(?failed, "Some exports failed");
        bail!("{} of {} exports failed", failed.len(), outcomes.len());
    }

    info!(results = %settings.results_dir.display(), "JSON documents and partitions written");
    Ok(())
}
