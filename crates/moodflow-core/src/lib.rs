//! Core types for MoodFlow.
//!
//! Mood models, the error taxonomy, the day/timezone policy that turns
//! strings into calendar days, the clock abstraction, encouragement quotes
//! and CLI settings.

pub mod clock;
pub mod error;
pub mod models;
pub mod quotes;
pub mod settings;
pub mod time_utils;

pub use error::{MoodError, Result, StoreError};
pub use models::{DayCell, Locale, Mood, MoodEntry, MoodEntryPatch, MoodStats, NewMoodEntry, WeekTrend};
pub use time_utils::{CalendarDay, DayPolicy};
