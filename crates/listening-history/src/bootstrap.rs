use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user application directory under the home directory.
pub const APP_DIR_NAME: &str = ".listening-history";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// `~/.listening-history`, or `./.listening-history` when there is no home.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Ensure the standard `~/.listening-history/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.listening-history/`
/// - `~/.listening-history/logs/`
/// - `~/.listening-history/data/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let app_dir = app_dir();
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("data"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `DEBUG`/`INFO`/`WARNING`/`ERROR`/`CRITICAL` level name to an
/// [`EnvFilter`] directive. Unknown names are passed through unchanged.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or is appended to `log_file` without ANSI colours
/// when one is given. Falls back to `"warn"` if the level is not recognised.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            registry.with(layer).try_init()?;
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            registry.with(layer).try_init()?;
        }
    }

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Directories scanned for history files.
///
/// Configured directories are used as given. Otherwise the defaults are, in
/// order, `./spotifyHistoryData`, `./public/data/spotifyHistoryData` and
/// `~/.listening-history/data`, keeping only those that exist.
pub fn discover_data_paths(configured: &[PathBuf]) -> Vec<PathBuf> {
    if !configured.is_empty() {
        return configured.to_vec();
    }
    default_data_paths(Path::new("."), &app_dir())
}

/// Existing default data directories relative to `cwd` and `app_dir`.
pub fn default_data_paths(cwd: &Path, app_dir: &Path) -> Vec<PathBuf> {
    let candidates = [
        cwd.join("spotifyHistoryData"),
        cwd.join("public").join("data").join("spotifyHistoryData"),
        app_dir.join("data"),
    ];
    candidates.into_iter().filter(|p| p.is_dir()).collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
