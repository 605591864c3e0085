//! Data layer for MoodFlow.
//!
//! The store contract and its in-memory implementation, snapshot loading,
//! day grouping with duplicate resolution, week/month projections and the
//! statistics engine.

pub mod aggregator;
pub mod projection;
pub mod reader;
pub mod stats;
pub mod store;

pub use moodflow_core as core;
