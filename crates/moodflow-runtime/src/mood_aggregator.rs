//! Session-level mood state and the operations that change it.
//!
//! [`MoodAggregator`] is built once per session with its store, clock and day
//! policy injected. It owns the single in-memory snapshot of entries, the
//! calendar cursor and the derived statistics, and publishes all of them as a
//! [`MoodState`] through a `watch` channel so presentation code can observe
//! changes without sharing mutable state.

use std::sync::Arc;

use chrono::Duration;
use moodflow_core::clock::Clock;
use moodflow_core::error::{MoodError, Result};
use moodflow_core::models::{DayCell, MoodEntry, MoodEntryPatch, MoodStats, NewMoodEntry};
use moodflow_core::quotes::quote_for;
use moodflow_core::time_utils::{shift_months, CalendarDay, DayPolicy};
use moodflow_data::aggregator::{CleanupReport, DayAggregator, FailedDeletion};
use moodflow_data::projection::{month_view, week_view};
use moodflow_data::stats::compute_stats;
use moodflow_data::store::MoodStore;
use tokio::sync::watch;

// ── Messages ──────────────────────────────────────────────────────────────────

pub const FETCH_ERROR: &str = "Failed to load mood entries";
pub const FETCH_BY_DATE_ERROR: &str = "Failed to load the mood for this date";
pub const SAVE_ERROR: &str = "Failed to save the mood";
pub const DELETE_ERROR: &str = "Failed to delete the mood";

// ── Public types ──────────────────────────────────────────────────────────────

/// Everything a consumer can observe about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodState {
    /// Latest snapshot of entries, duplicates included.
    pub entries: Vec<MoodEntry>,
    /// Result of the last [`MoodAggregator::fetch_by_date`].
    pub current_mood: Option<MoodEntry>,
    /// `true` while a store call is in flight.
    pub loading: bool,
    /// Human-readable message of the last failed operation.
    pub error: Option<String>,
    pub stats: MoodStats,
    /// Cursor used by the week and month views.
    pub reference_date: CalendarDay,
}

/// What [`MoodAggregator::save_mood`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    /// The stored entry, updated in place or newly created.
    pub entry: MoodEntry,
    /// `true` when an existing entry was updated.
    pub updated: bool,
    /// Same-day duplicates removed (or not) after the save.
    pub duplicates: CleanupReport,
}

// ── MoodAggregator ────────────────────────────────────────────────────────────

/// One user's mood session.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use moodflow_core::clock::SystemClock;
/// use moodflow_core::time_utils::DayPolicy;
/// use moodflow_data::store::MemoryMoodStore;
/// use moodflow_runtime::mood_aggregator::MoodAggregator;
///
/// # async fn run() {
/// let policy = DayPolicy::utc();
/// let moods = MoodAggregator::new(
///     Arc::new(MemoryMoodStore::new(policy)),
///     Arc::new(SystemClock),
///     policy,
/// );
/// moods.fetch_entries(None, None).await;
/// println!("average: {}", moods.stats().average_mood);
/// # }
/// ```
pub struct MoodAggregator {
    store: Arc<dyn MoodStore>,
    clock: Arc<dyn Clock>,
    policy: DayPolicy,
    state_tx: watch::Sender<MoodState>,
}

impl MoodAggregator {
    /// Create a session with an empty snapshot and the cursor on today.
    pub fn new(store: Arc<dyn MoodStore>, clock: Arc<dyn Clock>, policy: DayPolicy) -> Self {
        let today = policy.today(clock.now());
        let (state_tx, _) = watch::channel(MoodState {
            entries: Vec::new(),
            current_mood: None,
            loading: false,
            error: None,
            stats: MoodStats::default(),
            reference_date: today,
        });
        tracing::debug!(%today, tz = %policy.timezone(), "mood session created");
        Self {
            store,
            clock,
            policy,
            state_tx,
        }
    }

    // ── Observation ───────────────────────────────────────────────────────

    /// A receiver notified after every state change.
    ///
    /// Statistics that only change because the day rolled over are published
    /// on the next [`state`](Self::state) or [`stats`](Self::stats) call.
    pub fn subscribe(&self) -> watch::Receiver<MoodState> {
        self.state_tx.subscribe()
    }

    /// Copy of the current state, with statistics brought up to date for
    /// today's clock.
    pub fn state(&self) -> MoodState {
        self.refresh_stats();
        self.state_tx.borrow().clone()
    }

    pub fn entries(&self) -> Vec<MoodEntry> {
        self.state_tx.borrow().entries.clone()
    }

    pub fn current_mood(&self) -> Option<MoodEntry> {
        self.state_tx.borrow().current_mood.clone()
    }

    pub fn loading(&self) -> bool {
        self.state_tx.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state_tx.borrow().error.clone()
    }

    /// Statistics of the current snapshot as of today's clock.
    pub fn stats(&self) -> MoodStats {
        self.refresh_stats();
        self.state_tx.borrow().stats.clone()
    }

    pub fn reference_date(&self) -> CalendarDay {
        self.state_tx.borrow().reference_date
    }

    pub fn policy(&self) -> &DayPolicy {
        &self.policy
    }

    /// Today in the session's timezone.
    pub fn today(&self) -> CalendarDay {
        self.policy.today(self.clock.now())
    }

    // ── Store-backed operations ───────────────────────────────────────────

    /// Replace the snapshot with the store's entries for the range.
    ///
    /// Failures are recorded in [`MoodState::error`] and not returned.
    pub async fn fetch_entries(&self, start: Option<CalendarDay>, end: Option<CalendarDay>) {
        self.begin();
        match self.store.list(start, end).await {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "mood entries fetched");
                self.modify(|s| {
                    s.entries = entries;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetching mood entries failed");
                self.fail(FETCH_ERROR);
            }
        }
    }

    /// Load the entry for one day into [`MoodState::current_mood`].
    ///
    /// A missing entry is not an error. Failures, including a date that
    /// cannot be normalized, are recorded and not returned.
    pub async fn fetch_by_date(&self, date: &str) {
        self.begin();
        let day = match self.policy.normalize_day(date) {
            Ok(day) => day,
            Err(e) => {
                tracing::warn!(error = %e, "fetch_by_date called with an unusable date");
                self.fail(&e.to_string());
                return;
            }
        };

        match self.store.get_by_date(day).await {
            Ok(found) => {
                tracing::debug!(%day, found = found.is_some(), "mood for date fetched");
                self.modify(|s| {
                    s.current_mood = found;
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!(%day, error = %e, "fetching mood for date failed");
                self.fail(FETCH_BY_DATE_ERROR);
            }
        }
    }

    /// Create or update the mood of a day.
    ///
    /// When the day already has entries, the one with the highest id is
    /// updated and every other entry of that day is deleted best-effort.
    /// The update merges: date and mood are replaced, while note, intensity
    /// and interval are only replaced when `mood` carries them. Otherwise a
    /// new entry is created and appended. Failures are recorded and
    /// returned.
    pub async fn save_mood(&self, mood: NewMoodEntry) -> Result<SaveOutcome> {
        self.begin();

        let day = match self.policy.normalize_day(&mood.date) {
            Ok(day) => day,
            Err(e) => {
                self.fail(SAVE_ERROR);
                return Err(e);
            }
        };

        let entries = self.entries();
        let same_day = DayAggregator::entries_for_day(&entries, day, &self.policy);
        let target = DayAggregator::newest_by_id(&same_day).and_then(|e| e.id);

        let Some(target_id) = target else {
            return match self.store.create(mood).await {
                Ok(created) => {
                    tracing::debug!(id = ?created.id, %day, "mood created");
                    self.modify(|s| {
                        s.entries.push(created.clone());
                        s.loading = false;
                    });
                    Ok(SaveOutcome {
                        entry: created,
                        updated: false,
                        duplicates: CleanupReport::default(),
                    })
                }
                Err(e) => {
                    tracing::warn!(%day, error = %e, "creating mood failed");
                    self.fail(SAVE_ERROR);
                    Err(MoodError::Store(e))
                }
            };
        };

        let updated = match self.store.update(target_id, MoodEntryPatch::from(&mood)).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(id = target_id, error = %e, "updating mood failed");
                self.fail(SAVE_ERROR);
                return Err(MoodError::Store(e));
            }
        };
        tracing::debug!(id = target_id, %day, "mood updated");

        self.modify(|s| {
            match s.entries.iter_mut().find(|e| e.id == Some(target_id)) {
                Some(slot) => *slot = updated.clone(),
                None => s.entries.push(updated.clone()),
            }
        });

        let extra: Vec<i64> = same_day
            .iter()
            .filter_map(|e| e.id)
            .filter(|&id| id != target_id)
            .collect();
        let duplicates = self.delete_best_effort(&extra).await;

        self.modify(|s| s.loading = false);

        Ok(SaveOutcome {
            entry: updated,
            updated: true,
            duplicates,
        })
    }

    /// Delete one entry. Failures are recorded and returned.
    pub async fn delete_mood(&self, id: i64) -> Result<()> {
        self.begin();
        match self.store.delete(id).await {
            Ok(()) => {
                tracing::debug!(id, "mood deleted");
                self.modify(|s| {
                    s.entries.retain(|e| e.id != Some(id));
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "deleting mood failed");
                self.fail(DELETE_ERROR);
                Err(MoodError::Store(e))
            }
        }
    }

    /// Reduce every day of the snapshot to a single entry, keeping the
    /// highest id.
    ///
    /// Deletions run one after another; a failed deletion is logged, listed
    /// in the report and does not stop the others.
    pub async fn cleanup_duplicates(&self) -> CleanupReport {
        let plan = DayAggregator::plan_cleanup(&self.entries(), &self.policy);
        if plan.is_empty() {
            tracing::debug!("no duplicate mood entries found");
            return CleanupReport::default();
        }

        self.begin();
        let mut report = CleanupReport::default();
        for set in &plan {
            tracing::debug!(day = %set.day, keep = set.keep, remove = ?set.remove, "removing duplicates");
            report.merge(self.delete_best_effort(&set.remove).await);
        }
        self.modify(|s| s.loading = false);

        tracing::info!(
            deleted = report.deleted_count(),
            failed = report.failed.len(),
            "duplicate cleanup finished"
        );
        report
    }

    // ── Projections ───────────────────────────────────────────────────────

    /// The week around the cursor, duplicates resolved.
    pub fn week_moods(&self) -> Vec<DayCell> {
        let state = self.state_tx.borrow();
        week_view(&state.entries, state.reference_date, self.today(), &self.policy)
    }

    /// The month around the cursor on a Monday-first grid.
    pub fn month_moods(&self) -> Vec<Option<DayCell>> {
        let state = self.state_tx.borrow();
        month_view(&state.entries, state.reference_date, &self.policy)
    }

    /// Whether anything has been logged for today.
    pub fn has_entry_today(&self) -> bool {
        let today = self.today();
        DayAggregator::first_match(&self.state_tx.borrow().entries, today, &self.policy).is_some()
    }

    /// Encouragement for today's mood, if today has one.
    pub fn today_quote(&self) -> Option<&'static str> {
        let today = self.today();
        let state = self.state_tx.borrow();
        DayAggregator::representative(&state.entries, today, today, &self.policy)
            .map(|entry| quote_for(entry.mood, today))
    }

    // ── Navigation ────────────────────────────────────────────────────────

    pub fn next_week(&self) {
        self.move_cursor(|d| d + Duration::days(7));
    }

    pub fn previous_week(&self) {
        self.move_cursor(|d| d - Duration::days(7));
    }

    pub fn next_month(&self) {
        self.move_cursor(|d| shift_months(d, 1));
    }

    pub fn previous_month(&self) {
        self.move_cursor(|d| shift_months(d, -1));
    }

    /// Put the cursor on `date`.
    pub fn set_week(&self, date: CalendarDay) {
        self.move_cursor(|_| date);
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn move_cursor(&self, to: impl FnOnce(CalendarDay) -> CalendarDay) {
        self.modify(|s| s.reference_date = to(s.reference_date));
        tracing::debug!(reference = %self.reference_date(), "calendar cursor moved");
    }

    /// Mark a store call as started and clear the previous error.
    fn begin(&self) {
        self.state_tx.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    /// Record a failure and end the call; everything else is left as is.
    fn fail(&self, message: &str) {
        self.state_tx.send_modify(|s| {
            s.error = Some(message.to_string());
            s.loading = false;
        });
    }

    /// Apply `f` and recompute the statistics it may have invalidated.
    fn modify(&self, f: impl FnOnce(&mut MoodState)) {
        let today = self.today();
        let policy = self.policy;
        self.state_tx.send_modify(|s| {
            f(s);
            let week = week_view(&s.entries, s.reference_date, today, &policy);
            s.stats = compute_stats(&s.entries, &week);
        });
    }

    /// Recompute the statistics for the current day and publish them only
    /// if they changed, e.g. after the clock crossed midnight.
    fn refresh_stats(&self) {
        let today = self.today();
        let policy = self.policy;
        let changed = self.state_tx.send_if_modified(|s| {
            let week = week_view(&s.entries, s.reference_date, today, &policy);
            let stats = compute_stats(&s.entries, &week);
            if stats == s.stats {
                return false;
            }
            s.stats = stats;
            true
        });
        if changed {
            tracing::debug!(%today, "statistics refreshed for a new day");
        }
    }

    /// Delete `ids` one at a time, dropping each success from the snapshot.
    async fn delete_best_effort(&self, ids: &[i64]) -> CleanupReport {
        let mut report = CleanupReport::default();
        for &id in ids {
            match self.store.delete(id).await {
                Ok(()) => {
                    report.deleted.push(id);
                    self.modify(|s| s.entries.retain(|e| e.id != Some(id)));
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "duplicate deletion failed; continuing");
                    report.failed.push(FailedDeletion {
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
