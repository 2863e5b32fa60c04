use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading and summarising listening history.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A history file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A batch did not finish loading within the configured timeout.
    #[error("Timed out after {secs}s while loading batch {name}")]
    BatchTimeout { name: String, secs: u64 },

    /// The task loading a batch panicked or was cancelled.
    #[error("Batch loader task failed: {0}")]
    BatchTask(String),

    /// No batch source could be discovered at all.
    #[error("No listening history files were found to load")]
    NoBatchesAvailable,

    /// Every discovered batch failed to load.
    #[error("Failed to load all {} listening history batches: {cause}", .failed.len())]
    AllBatchesFailed { failed: Vec<String>, cause: String },

    /// The file-name pattern is not a valid regular expression.
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(String),
}

/// Convenience alias used throughout the history crates.
pub type Result<T> = std::result::Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = HistoryError::FileRead {
            path: PathBuf::from("/some/Streaming_History_Audio_2023.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("Streaming_History_Audio_2023.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_batch_timeout() {
        let err = HistoryError::BatchTimeout {
            name: "slow.json".to_string(),
            secs: 5,
        };
        assert_eq!(err.to_string(), "Timed out after 5s while loading batch slow.json");
    }

    #[test]
    fn test_error_display_no_batches() {
        let err = HistoryError::NoBatchesAvailable;
        assert_eq!(err.to_string(), "No listening history files were found to load");
    }

    #[test]
    fn test_error_display_all_batches_failed() {
        let err = HistoryError::AllBatchesFailed {
            failed: vec!["a.json".to_string(), "b.json".to_string()],
            cause: "a.json: broken".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load all 2 listening history batches: a.json: broken"
        );
    }

    #[test]
    fn test_error_display_invalid_pattern() {
        let err = HistoryError::InvalidPattern("unclosed group".to_string());
        assert_eq!(err.to_string(), "Invalid file pattern: unclosed group");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: HistoryError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
