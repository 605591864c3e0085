//! Session layer for MoodFlow.
//!
//! Owns the mood snapshot, the calendar cursor and the derived statistics
//! for one session, and exposes the operations consumers call on them.

pub mod mood_aggregator;

pub use moodflow_core as core;
pub use moodflow_data as data;
