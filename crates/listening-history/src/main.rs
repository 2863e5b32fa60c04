mod bootstrap;
mod report;

use std::time::Duration;

use anyhow::{Context, Result};
use history_core::settings::Settings;
use history_core::time_utils::resolve_timezone;
use history_data::reader::{compile_pattern, discover_sources};
use history_runtime::loader::BatchLoader;
use history_runtime::store::HistoryStore;

use crate::report::View;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Listening History v{} starting", env!("CARGO_PKG_VERSION"));

    let tz = resolve_timezone(&settings.timezone);
    let view = View::from_name(&settings.view)
        .with_context(|| format!("Unknown view: {}", settings.view))?;
    tracing::info!("View: {}, Timezone: {}", settings.view, tz.name());

    let data_dirs = bootstrap::discover_data_paths(&settings.data_dirs);
    if data_dirs.is_empty() {
        anyhow::bail!("No data directory found; pass --data-dir <DIR>");
    }
    for dir in &data_dirs {
        tracing::info!("Data directory: {}", dir.display());
    }

    let pattern = compile_pattern(&settings.file_pattern)?;
    let sources = discover_sources(&data_dirs, &pattern);

    let loader = BatchLoader::new(Duration::from_secs(settings.timeout_secs));
    let mut store = HistoryStore::new(loader, tz);
    store
        .load_history(&sources)
        .await
        .context("Could not load listening history")?;

    if let Some(warning) = store.warning() {
        eprintln!("{}", warning);
    }

    let summary = store
        .filtered_summary()
        .context("No summary available after loading")?;
    let text = report::render(summary, view, settings.limit as usize, &tz)?;
    println!("{}", text);

    Ok(())
}
