//! Runtime layer for the listening history analyzer.
//!
//! Loads history batches concurrently and holds the resulting summary and
//! load status for consumers.

pub mod loader;
pub mod store;

pub use history_core as core;
pub use history_data as data;
