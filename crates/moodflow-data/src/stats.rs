//! Distribution, average and trend statistics.
//!
//! Statistics are computed over the raw entry collection: duplicates count.
//! Only the trend looks at the deduplicated week projection.

use moodflow_core::models::{empty_distribution, DayCell, Mood, MoodEntry, MoodStats, WeekTrend};

/// How many of the week's most recent resolved days feed the trend.
const TREND_WINDOW: usize = 5;

/// Fewer resolved days than this and the trend is always stable.
const TREND_MIN_DAYS: usize = 3;

/// Mean difference between the two halves needed to call a direction.
const TREND_THRESHOLD: f64 = 0.5;

/// Compute every statistic for `entries`, using `week` for the trend.
///
/// An empty collection yields [`MoodStats::default`].
pub fn compute_stats(entries: &[MoodEntry], week: &[DayCell]) -> MoodStats {
    if entries.is_empty() {
        return MoodStats::default();
    }

    let mut distribution = empty_distribution();
    for entry in entries {
        *distribution.entry(entry.mood).or_default() += 1;
    }

    let sum: u32 = entries.iter().map(|e| u32::from(e.mood.ordinal())).sum();
    let average = f64::from(sum) / entries.len() as f64;

    MoodStats {
        average_mood: round_one_decimal(average),
        most_frequent_mood: most_frequent(entries),
        total_entries: entries.len(),
        week_trend: week_trend(week),
        mood_distribution: distribution,
    }
}

/// The mood logged most often.
///
/// Ties go to the mood whose first entry appears earliest in `entries`.
/// Returns [`Mood::Neutral`] for an empty slice.
pub fn most_frequent(entries: &[MoodEntry]) -> Mood {
    let mut first_seen: Vec<Mood> = Vec::with_capacity(Mood::ALL.len());
    let mut counts = empty_distribution();

    for entry in entries {
        if !first_seen.contains(&entry.mood) {
            first_seen.push(entry.mood);
        }
        *counts.entry(entry.mood).or_default() += 1;
    }

    let mut best: Option<(Mood, usize)> = None;
    for mood in first_seen {
        let count = counts[&mood];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((mood, count));
        }
    }
    best.map(|(mood, _)| mood).unwrap_or(Mood::Neutral)
}

/// Trend of the last resolved days of a week projection.
pub fn week_trend(week: &[DayCell]) -> WeekTrend {
    let resolved: Vec<u8> = week
        .iter()
        .filter_map(|cell| cell.mood.as_ref())
        .map(|entry| entry.mood.ordinal())
        .collect();

    let recent = &resolved[resolved.len().saturating_sub(TREND_WINDOW)..];
    trend_from_ordinals(recent)
}

/// Compare the mean of the second half of `values` with the first half.
///
/// The split point is `len / 2`, so an odd element lands in the second half.
pub fn trend_from_ordinals(values: &[u8]) -> WeekTrend {
    if values.len() < TREND_MIN_DAYS {
        return WeekTrend::Stable;
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_avg = mean(first);
    let second_avg = mean(second);

    if second_avg > first_avg + TREND_THRESHOLD {
        WeekTrend::Up
    } else if second_avg < first_avg - TREND_THRESHOLD {
        WeekTrend::Down
    } else {
        WeekTrend::Stable
    }
}

/// Round half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: &[u8]) -> f64 {
    let sum: u32 = values.iter().map(|&v| u32::from(v)).sum();
    f64::from(sum) / values.len() as f64
}

// ── Tests ─────────────────────────────────────────────────────────────────────
