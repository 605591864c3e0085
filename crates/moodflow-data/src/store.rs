//! The narrow contract MoodFlow needs from a remote mood store, plus an
//! in-process implementation.
//!
//! [`MoodStore`] is the only seam through which entries are read or written.
//! [`MemoryMoodStore`] keeps entries in memory, hands out increasing ids and
//! can be told to fail specific calls so error paths are observable without a
//! network.

use std::collections::HashSet;

use async_trait::async_trait;
use moodflow_core::models::{MoodEntry, MoodEntryPatch, NewMoodEntry};
use moodflow_core::time_utils::{CalendarDay, DayPolicy};
use moodflow_core::StoreError;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of a single store call.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ── MoodStore ─────────────────────────────────────────────────────────────────

/// Create / read / update / delete access to persisted mood entries.
///
/// Implementations may return several entries for the same day; callers are
/// expected to tolerate that.
#[async_trait]
pub trait MoodStore: Send + Sync {
    /// Entries whose day lies within the inclusive `[start, end]` range.
    /// Either bound may be omitted.
    async fn list(
        &self,
        start: Option<CalendarDay>,
        end: Option<CalendarDay>,
    ) -> StoreResult<Vec<MoodEntry>>;

    /// One entry for `day`, or `None` when nothing was logged.
    async fn get_by_date(&self, day: CalendarDay) -> StoreResult<Option<MoodEntry>>;

    /// Persist a new entry; the store assigns the id.
    async fn create(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry>;

    /// Apply `patch` to entry `id` and return the stored result.
    async fn update(&self, id: i64, patch: MoodEntryPatch) -> StoreResult<MoodEntry>;

    async fn delete(&self, id: i64) -> StoreResult<()>;
}

// ── MemoryMoodStore ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<MoodEntry>,
    next_id: i64,
    /// Number of upcoming calls (of any kind) that fail with a transport error.
    fail_next: usize,
    /// Ids whose deletion always fails.
    failing_deletes: HashSet<i64>,
    /// Ids successfully deleted, in call order.
    delete_log: Vec<i64>,
}

impl MemoryState {
    fn take_injected_failure(&mut self, call: &str) -> StoreResult<()> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            debug!(call, remaining = self.fail_next, "injected store failure");
            return Err(StoreError::Transport(format!("injected failure on {call}")));
        }
        Ok(())
    }
}

/// In-memory [`MoodStore`] with failure injection.
#[derive(Debug)]
pub struct MemoryMoodStore {
    policy: DayPolicy,
    state: Mutex<MemoryState>,
}

impl MemoryMoodStore {
    /// Empty store; ids start at 1.
    pub fn new(policy: DayPolicy) -> Self {
        Self::with_entries(policy, Vec::new())
    }

    /// Store pre-filled with `entries`.
    ///
    /// Entries that already carry an id keep it; the others receive fresh
    /// ids above the highest existing one.
    pub fn with_entries(policy: DayPolicy, entries: Vec<MoodEntry>) -> Self {
        let mut next_id = entries.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1;
        let entries = entries
            .into_iter()
            .map(|mut e| {
                if e.id.is_none() {
                    e.id = Some(next_id);
                    next_id += 1;
                }
                e
            })
            .collect();

        Self {
            policy,
            state: Mutex::new(MemoryState {
                entries,
                next_id,
                ..Default::default()
            }),
        }
    }

    /// Make the next `count` calls fail with [`StoreError::Transport`].
    pub async fn fail_next(&self, count: usize) {
        self.state.lock().await.fail_next = count;
    }

    /// Make every deletion of `id` fail with [`StoreError::Transport`].
    pub async fn fail_deletes_of(&self, id: i64) {
        self.state.lock().await.failing_deletes.insert(id);
    }

    /// Copy of everything currently stored, in insertion order.
    pub async fn snapshot(&self) -> Vec<MoodEntry> {
        self.state.lock().await.entries.clone()
    }

    /// Ids removed by successful `delete` calls, in the order they arrived.
    pub async fn delete_log(&self) -> Vec<i64> {
        self.state.lock().await.delete_log.clone()
    }

    fn day_of(&self, entry: &MoodEntry) -> Option<CalendarDay> {
        self.policy.normalize_day(&entry.date).ok()
    }
}

#[async_trait]
impl MoodStore for MemoryMoodStore {
    async fn list(
        &self,
        start: Option<CalendarDay>,
        end: Option<CalendarDay>,
    ) -> StoreResult<Vec<MoodEntry>> {
        let mut state = self.state.lock().await;
        state.take_injected_failure("list")?;

        if start.is_none() && end.is_none() {
            return Ok(state.entries.clone());
        }

        let entries = state
            .entries
            .iter()
            .filter(|e| match self.day_of(e) {
                Some(day) => start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e),
                None => false,
            })
            .cloned()
            .collect();
        Ok(entries)
    }

    async fn get_by_date(&self, day: CalendarDay) -> StoreResult<Option<MoodEntry>> {
        let mut state = self.state.lock().await;
        state.take_injected_failure("get_by_date")?;

        Ok(state
            .entries
            .iter()
            .find(|e| self.day_of(e) == Some(day))
            .cloned())
    }

    async fn create(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        let mut state = self.state.lock().await;
        state.take_injected_failure("create")?;

        let id = state.next_id;
        state.next_id += 1;
        let created = MoodEntry::from_new(id, entry);
        state.entries.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, patch: MoodEntryPatch) -> StoreResult<MoodEntry> {
        let mut state = self.state.lock().await;
        state.take_injected_failure("update")?;

        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        entry.apply(&patch);
        Ok(entry.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.take_injected_failure("delete")?;

        if state.failing_deletes.contains(&id) {
            return Err(StoreError::Transport(format!("delete of {id} rejected")));
        }

        let before = state.entries.len();
        state.entries.retain(|e| e.id != Some(id));
        if state.entries.len() == before {
            return Err(StoreError::NotFound(id));
        }
        state.delete_log.push(id);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use moodflow_core::models::Mood;

    fn day(s: &str) -> CalendarDay {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(id: Option<i64>, date: &str, mood: Mood) -> MoodEntry {
        MoodEntry {
            id,
            date: date.to_string(),
            mood,
            note: None,
            intensity: None,
            begin_at: None,
            end_at: None,
        }
    }

    // ── ids ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_with_entries_assigns_missing_ids_above_max() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(10), "2024-01-15", Mood::Good), entry(None, "2024-01-16", Mood::Sad)],
        );
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot[1].id, Some(11));

        let created = store.create(NewMoodEntry::new("2024-01-17", Mood::Happy)).await.unwrap();
        assert_eq!(created.id, Some(12));
    }

    // ── list ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_filters_inclusive_range() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![
                entry(Some(1), "2024-01-14", Mood::Good),
                entry(Some(2), "2024-01-15T10:00:00Z", Mood::Sad),
                entry(Some(3), "2024-01-16", Mood::Happy),
                entry(Some(4), "2024-01-17", Mood::Angry),
            ],
        );
        let listed = store
            .list(Some(day("2024-01-15")), Some(day("2024-01-16")))
            .await
            .unwrap();
        let ids: Vec<i64> = listed.iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_list_without_range_returns_everything() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(1), "garbage", Mood::Good), entry(Some(2), "2024-01-15", Mood::Sad)],
        );
        assert_eq!(store.list(None, None).await.unwrap().len(), 2);
    }

    // ── get_by_date ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_by_date_found_and_missing() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(1), "2024-01-15", Mood::Good)],
        );
        let found = store.get_by_date(day("2024-01-15")).await.unwrap();
        assert_eq!(found.and_then(|e| e.id), Some(1));
        assert!(store.get_by_date(day("2024-01-16")).await.unwrap().is_none());
    }

    // ── update / delete ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_update_applies_patch() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(1), "2024-01-15", Mood::Good)],
        );
        let patch = MoodEntryPatch {
            mood: Some(Mood::Angry),
            ..Default::default()
        };
        let updated = store.update(1, patch).await.unwrap();
        assert_eq!(updated.mood, Mood::Angry);
        assert_eq!(store.snapshot().await[0].mood, Mood::Angry);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryMoodStore::new(DayPolicy::utc());
        let err = store.update(99, MoodEntryPatch::default()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(99));
    }

    #[tokio::test]
    async fn test_delete_removes_and_logs() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(1), "2024-01-15", Mood::Good), entry(Some(2), "2024-01-16", Mood::Sad)],
        );
        store.delete(1).await.unwrap();
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(store.delete_log().await, vec![1]);
        assert_eq!(store.delete(1).await.unwrap_err(), StoreError::NotFound(1));
    }

    // ── failure injection ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fail_next_counts_down() {
        let store = MemoryMoodStore::new(DayPolicy::utc());
        store.fail_next(2).await;
        assert!(store.list(None, None).await.is_err());
        assert!(store.create(NewMoodEntry::new("2024-01-15", Mood::Good)).await.is_err());
        assert!(store.list(None, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_deletes_of_specific_id() {
        let store = MemoryMoodStore::with_entries(
            DayPolicy::utc(),
            vec![entry(Some(1), "2024-01-15", Mood::Good), entry(Some(2), "2024-01-15", Mood::Sad)],
        );
        store.fail_deletes_of(1).await;
        assert!(matches!(store.delete(1).await, Err(StoreError::Transport(_))));
        assert!(store.delete(2).await.is_ok());
        assert_eq!(store.snapshot().await.len(), 1);
    }
}
