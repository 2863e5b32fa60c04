//! Core types for listening-history statistics.
//!
//! Holds the play-event data model, the summary output types, the error
//! type, timestamp and timezone helpers, display formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{HistoryError, Result};
