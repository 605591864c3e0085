//! Day grouping and duplicate resolution.
//!
//! The store may hand back several entries for one calendar day. Everything
//! here is a pure function of an entry slice: find the entries of a day, pick
//! the one that represents it, and plan which duplicates to remove.

use std::collections::BTreeMap;

use chrono::Duration;
use moodflow_core::models::MoodEntry;
use moodflow_core::time_utils::{CalendarDay, DayPolicy};
use serde::Serialize;
use tracing::warn;

// ── Cleanup planning ──────────────────────────────────────────────────────────

/// The duplicates found for one day and what to do with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    pub day: CalendarDay,
    /// Highest id of the day; survives cleanup.
    pub keep: i64,
    /// Every other persisted id of the day, in iteration order.
    pub remove: Vec<i64>,
}

/// One deletion that the store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub id: i64,
    pub error: String,
}

/// Outcome of a best-effort duplicate removal pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Ids the store deleted, in call order.
    pub deleted: Vec<i64>,
    /// Ids whose deletion failed, with the store's message.
    pub failed: Vec<FailedDeletion>,
}

impl CleanupReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: CleanupReport) {
        self.deleted.extend(other.deleted);
        self.failed.extend(other.failed);
    }
}

// ── DayAggregator ─────────────────────────────────────────────────────────────

/// Stateless helper that groups entries by calendar day and resolves
/// same-day duplicates.
pub struct DayAggregator;

impl DayAggregator {
    /// Group `entries` by normalized day, keeping iteration order inside each
    /// group.
    ///
    /// Entries whose date cannot be normalized belong to no day; they are
    /// skipped with a warning.
    pub fn group_by_day<'a>(
        entries: &'a [MoodEntry],
        policy: &DayPolicy,
    ) -> BTreeMap<CalendarDay, Vec<&'a MoodEntry>> {
        let mut map: BTreeMap<CalendarDay, Vec<&'a MoodEntry>> = BTreeMap::new();

        for entry in entries {
            match policy.normalize_day(&entry.date) {
                Ok(day) => map.entry(day).or_default().push(entry),
                Err(e) => warn!(id = ?entry.id, error = %e, "entry has no usable day; skipped"),
            }
        }

        map
    }

    /// All entries belonging to `day`, in iteration order.
    pub fn entries_for_day<'a>(
        entries: &'a [MoodEntry],
        day: CalendarDay,
        policy: &DayPolicy,
    ) -> Vec<&'a MoodEntry> {
        entries
            .iter()
            .filter(|e| policy.normalize_day(&e.date).ok() == Some(day))
            .collect()
    }

    /// The first entry belonging to `day`, ignoring any duplicates.
    pub fn first_match<'a>(
        entries: &'a [MoodEntry],
        day: CalendarDay,
        policy: &DayPolicy,
    ) -> Option<&'a MoodEntry> {
        entries
            .iter()
            .find(|e| policy.normalize_day(&e.date).ok() == Some(day))
    }

    /// The entry that stands for `day`.
    ///
    /// With several candidates, `today` is decided by the latest `beginAt`
    /// and every other day by the longest `endAt - beginAt`. Ties keep the
    /// candidate met first.
    pub fn representative<'a>(
        entries: &'a [MoodEntry],
        day: CalendarDay,
        today: CalendarDay,
        policy: &DayPolicy,
    ) -> Option<&'a MoodEntry> {
        let group = Self::entries_for_day(entries, day, policy);
        Self::pick(&group, day == today, policy)
    }

    /// Apply the selection rule to an already-built group.
    pub fn pick<'a>(
        group: &[&'a MoodEntry],
        is_today: bool,
        policy: &DayPolicy,
    ) -> Option<&'a MoodEntry> {
        match group {
            [] => None,
            [only] => Some(*only),
            _ if is_today => Self::latest_start(group, policy),
            _ => Self::longest(group, policy),
        }
    }

    /// How long an entry lasted; zero when either bound is missing or
    /// unparseable.
    pub fn duration(entry: &MoodEntry, policy: &DayPolicy) -> Duration {
        let begin = entry.begin_at.as_deref().and_then(|s| policy.parse_timestamp(s));
        let end = entry.end_at.as_deref().and_then(|s| policy.parse_timestamp(s));
        match (begin, end) {
            (Some(b), Some(e)) => e - b,
            _ => Duration::zero(),
        }
    }

    /// Highest-id entry of a group; entries without an id never win.
    pub fn newest_by_id<'a>(group: &[&'a MoodEntry]) -> Option<&'a MoodEntry> {
        group
            .iter()
            .copied()
            .filter(|e| e.id.is_some())
            .fold(None::<&'a MoodEntry>, |best, e| match best {
                Some(b) if b.id >= e.id => Some(b),
                _ => Some(e),
            })
    }

    /// For every day holding more than one persisted entry, the id to keep
    /// (the highest) and the ids to delete.
    ///
    /// Entries without an id cannot be deleted and are ignored.
    pub fn plan_cleanup(entries: &[MoodEntry], policy: &DayPolicy) -> Vec<DuplicateSet> {
        Self::group_by_day(entries, policy)
            .into_iter()
            .filter_map(|(day, group)| {
                let ids: Vec<i64> = group.iter().filter_map(|e| e.id).collect();
                if ids.len() < 2 {
                    return None;
                }
                let keep = *ids.iter().max()?;
                let remove = ids.into_iter().filter(|&id| id != keep).collect();
                Some(DuplicateSet { day, keep, remove })
            })
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn latest_start<'a>(group: &[&'a MoodEntry], policy: &DayPolicy) -> Option<&'a MoodEntry> {
        let mut best: Option<(&'a MoodEntry, Option<chrono::DateTime<chrono::Utc>>)> = None;
        for &entry in group {
            let start = entry.begin_at.as_deref().and_then(|s| policy.parse_timestamp(s));
            best = match best {
                // `None < Some(_)`, so a missing start ranks earliest.
                Some((_, best_start)) if start > best_start => Some((entry, start)),
                None => Some((entry, start)),
                keep => keep,
            };
        }
        best.map(|(entry, _)| entry)
    }

    fn longest<'a>(group: &[&'a MoodEntry], policy: &DayPolicy) -> Option<&'a MoodEntry> {
        let mut best: Option<(&'a MoodEntry, Duration)> = None;
        for &entry in group {
            let length = Self::duration(entry, policy);
            best = match best {
                Some((_, best_length)) if length > best_length => Some((entry, length)),
                None => Some((entry, length)),
                keep => keep,
            };
        }
        best.map(|(entry, _)| entry)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
