//! Data layer for the listening history analyzer.
//!
//! Discovers and reads history batches, validates and merges play records
//! into the canonical event sequence, and aggregates that sequence into a
//! [`core::models::Summary`].

pub mod aggregator;
pub mod normalizer;
pub mod reader;

pub use history_core as core;
