use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MoodError;
use crate::time_utils::CalendarDay;

// ── Mood ──────────────────────────────────────────────────────────────────────

/// The closed set of emotional states a user can log.
///
/// Declaration order (happiest first) is also the `Ord` order, which keeps
/// [`MoodDistribution`] maps in a stable display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Good,
    Neutral,
    Sad,
    Angry,
}

impl Mood {
    /// Every mood, happiest first.
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Good, Mood::Neutral, Mood::Sad, Mood::Angry];

    /// Position on the ordinal scale used for averages and trends
    /// (angry = 1 … happy = 5).
    pub fn ordinal(self) -> u8 {
        match self {
            Mood::Angry => 1,
            Mood::Sad => 2,
            Mood::Neutral => 3,
            Mood::Good => 4,
            Mood::Happy => 5,
        }
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😄",
            Mood::Good => "🙂",
            Mood::Neutral => "😐",
            Mood::Sad => "😢",
            Mood::Angry => "😠",
        }
    }

    /// Hex colour used for calendar cells.
    pub fn color(self) -> &'static str {
        match self {
            Mood::Happy => "#FFD93D",
            Mood::Good => "#6BCB77",
            Mood::Neutral => "#4D96FF",
            Mood::Sad => "#9B9B9B",
            Mood::Angry => "#FF6B6B",
        }
    }

    /// Human-readable label in the given locale.
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Mood::Happy) => "Very happy",
            (Locale::En, Mood::Good) => "Good",
            (Locale::En, Mood::Neutral) => "Neutral",
            (Locale::En, Mood::Sad) => "Sad",
            (Locale::En, Mood::Angry) => "Angry",
            (Locale::Fr, Mood::Happy) => "Très content",
            (Locale::Fr, Mood::Good) => "Bien",
            (Locale::Fr, Mood::Neutral) => "Neutre",
            (Locale::Fr, Mood::Sad) => "Triste",
            (Locale::Fr, Mood::Angry) => "En colère",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MoodError::InvalidMood(s.to_string()))
    }
}

// ── Locale ────────────────────────────────────────────────────────────────────

/// Language used for weekday names and mood labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl FromStr for Locale {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "fr" | "fr-fr" => Ok(Locale::Fr),
            other => Err(MoodError::Config(format!("unsupported locale \"{other}\""))),
        }
    }
}

// ── Entries ───────────────────────────────────────────────────────────────────

/// One logged emotional state, as exchanged with the mood store.
///
/// `date` keeps whatever the store sent; only its first ten characters
/// (`YYYY-MM-DD`) decide which calendar day the entry belongs to.
/// `begin_at` / `end_at` stay as raw strings and are parsed on demand by
/// [`DayPolicy`](crate::time_utils::DayPolicy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    /// Store-assigned identifier; `None` until the entry has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Free-range strength indicator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
}

impl MoodEntry {
    /// Attach a store-assigned id to a not-yet-persisted entry.
    pub fn from_new(id: i64, new: NewMoodEntry) -> Self {
        Self {
            id: Some(id),
            date: new.date,
            mood: new.mood,
            note: new.note,
            intensity: new.intensity,
            begin_at: new.begin_at,
            end_at: new.end_at,
        }
    }

    /// Overwrite every field the patch carries; absent fields are untouched.
    pub fn apply(&mut self, patch: &MoodEntryPatch) {
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
        if patch.note.is_some() {
            self.note = patch.note.clone();
        }
        if patch.intensity.is_some() {
            self.intensity = patch.intensity;
        }
        if patch.begin_at.is_some() {
            self.begin_at = patch.begin_at.clone();
        }
        if patch.end_at.is_some() {
            self.end_at = patch.end_at.clone();
        }
    }
}

/// A mood entry that has not been stored yet (no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMoodEntry {
    pub date: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
}

impl NewMoodEntry {
    pub fn new(date: impl Into<String>, mood: Mood) -> Self {
        Self {
            date: date.into(),
            mood,
            note: None,
            intensity: None,
            begin_at: None,
            end_at: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_interval(mut self, begin_at: impl Into<String>, end_at: Option<String>) -> Self {
        self.begin_at = Some(begin_at.into());
        self.end_at = end_at;
        self
    }
}

/// Partial update sent to the store; `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
}

/// The patch `save_mood` sends when a day already has an entry.
///
/// Date and mood are always overwritten. Note, intensity and interval are
/// only overwritten when the new entry carries them, so re-saving a day with
/// just a mood keeps the note recorded earlier.
impl From<&NewMoodEntry> for MoodEntryPatch {
    fn from(new: &NewMoodEntry) -> Self {
        Self {
            date: Some(new.date.clone()),
            mood: Some(new.mood),
            note: new.note.clone(),
            intensity: new.intensity,
            begin_at: new.begin_at.clone(),
            end_at: new.end_at.clone(),
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Direction of the mood curve over the most recent days of a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekTrend {
    Up,
    Down,
    #[default]
    Stable,
}

impl fmt::Display for WeekTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekTrend::Up => "up",
            WeekTrend::Down => "down",
            WeekTrend::Stable => "stable",
        })
    }
}

/// Count of entries per mood; every mood is always present as a key.
pub type MoodDistribution = BTreeMap<Mood, usize>;

/// A distribution with every mood at zero.
pub fn empty_distribution() -> MoodDistribution {
    Mood::ALL.into_iter().map(|m| (m, 0)).collect()
}

/// Rollup statistics derived from the full entry collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodStats {
    /// Mean ordinal value rounded to one decimal; `0.0` when empty.
    pub average_mood: f64,
    pub most_frequent_mood: Mood,
    /// Raw number of entries, duplicates included.
    pub total_entries: usize,
    pub week_trend: WeekTrend,
    pub mood_distribution: MoodDistribution,
}

impl Default for MoodStats {
    fn default() -> Self {
        Self {
            average_mood: 0.0,
            most_frequent_mood: Mood::Neutral,
            total_entries: 0,
            week_trend: WeekTrend::Stable,
            mood_distribution: empty_distribution(),
        }
    }
}

// ── Calendar cells ────────────────────────────────────────────────────────────

/// One day of a week or month grid with its representative entry, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: CalendarDay,
    /// Localized abbreviated weekday name.
    pub day_name: String,
    pub mood: Option<MoodEntry>,
}
