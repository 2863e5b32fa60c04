//! History file discovery and batch sources.
//!
//! A batch is one named list of raw play records, usually one JSON file of a
//! streaming-history export. Sources only fetch and parse; validation of the
//! individual records happens in [`crate::normalizer`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use history_core::error::{HistoryError, Result};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

// ── BatchSource ───────────────────────────────────────────────────────────────

/// A named provider of raw play records.
///
/// Each source fails independently; a failing source never affects its
/// siblings.
pub trait BatchSource: Send + Sync {
    /// Name reported in warnings and source metadata.
    fn name(&self) -> &str;

    /// Fetch the raw records. Records are not validated here.
    fn fetch(&self) -> Result<Vec<Value>>;
}

/// A JSON file whose top-level value is an array of play records.
///
/// Any other well-formed JSON document loads as an empty batch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    /// The batch name is the file name of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BatchSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| HistoryError::FileRead {
                path: self.path.clone(),
                source,
            })?;

        match serde_json::from_str::<Value>(&content)? {
            Value::Array(records) => {
                debug!("Read {} records from {}", records.len(), self.path.display());
                Ok(records)
            }
            _ => {
                warn!(
                    "{} is not a JSON array of play records; treating it as empty",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }
}

/// An in-memory batch, used for embedded data and tests.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    records: Vec<Value>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl BatchSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        Ok(self.records.clone())
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Compile a file-name pattern, mapping regex errors into [`HistoryError`].
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HistoryError::InvalidPattern(e.to_string()))
}

/// Find history files under each of `data_dirs`, recursively.
///
/// A file is kept when its file name matches `pattern`. Files are sorted by
/// path within each directory and directories are visited in the given
/// order; that order is the batch discovery order. A file reachable from
/// more than one directory is returned once.
pub fn find_history_files(data_dirs: &[PathBuf], pattern: &Regex) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut all_files: Vec<PathBuf> = Vec::new();

    for dir in data_dirs {
        if !dir.exists() {
            warn!("Data path does not exist: {}", dir.display());
            continue;
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && pattern.is_match(&entry.file_name().to_string_lossy())
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        debug!("Found {} history files in {}", files.len(), dir.display());

        for file in files {
            let key = file.canonicalize().unwrap_or_else(|_| file.clone());
            if seen.insert(key) {
                all_files.push(file);
            }
        }
    }

    all_files
}

/// Build one [`JsonFileSource`] per discovered history file.
pub fn discover_sources(data_dirs: &[PathBuf], pattern: &Regex) -> Vec<Arc<dyn BatchSource>> {
    find_history_files(data_dirs, pattern)
        .into_iter()
        .map(|path| Arc::new(JsonFileSource::new(path)) as Arc<dyn BatchSource>)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
