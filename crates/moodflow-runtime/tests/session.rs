//! End-to-end behaviour of a mood session over the in-memory store.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone as _, Utc};
use moodflow_core::clock::FixedClock;
use moodflow_core::error::MoodError;
use moodflow_core::models::{Mood, MoodEntry, NewMoodEntry, WeekTrend};
use moodflow_core::quotes::quotes;
use moodflow_core::time_utils::{CalendarDay, DayPolicy};
use moodflow_data::store::MemoryMoodStore;
use moodflow_runtime::mood_aggregator::{
    MoodAggregator, DELETE_ERROR, FETCH_BY_DATE_ERROR, FETCH_ERROR, SAVE_ERROR,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn day(s: &str) -> CalendarDay {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn entry(id: i64, date: &str, mood: Mood) -> MoodEntry {
    MoodEntry {
        id: Some(id),
        date: date.to_string(),
        mood,
        note: None,
        intensity: None,
        begin_at: None,
        end_at: None,
    }
}

fn timed(id: i64, date: &str, mood: Mood, begin: &str, end: &str) -> MoodEntry {
    MoodEntry {
        begin_at: Some(begin.to_string()),
        end_at: Some(end.to_string()),
        ..entry(id, date, mood)
    }
}

/// Good, Good, Happy, Happy, Happy on Mon 2024-01-15 .. Fri 2024-01-19.
fn weekday_entries() -> Vec<MoodEntry> {
    vec![
        entry(1, "2024-01-15", Mood::Good),
        entry(2, "2024-01-16", Mood::Good),
        entry(3, "2024-01-17", Mood::Happy),
        entry(4, "2024-01-18", Mood::Happy),
        entry(5, "2024-01-19", Mood::Happy),
    ]
}

/// A session whose clock reads noon UTC on `today`.
fn session(
    today: &str,
    entries: Vec<MoodEntry>,
) -> (MoodAggregator, Arc<MemoryMoodStore>, Arc<FixedClock>) {
    let policy = DayPolicy::utc();
    let store = Arc::new(MemoryMoodStore::with_entries(policy, entries));
    let d = day(today);
    let clock = Arc::new(FixedClock::new(
        Utc.from_utc_datetime(&d.and_hms_opt(12, 0, 0).unwrap()),
    ));
    let moods = MoodAggregator::new(store.clone(), clock.clone(), policy);
    (moods, store, clock)
}

fn ids(entries: &[MoodEntry]) -> Vec<i64> {
    entries.iter().filter_map(|e| e.id).collect()
}

// ── Fetching ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_populates_entries_and_stats() {
    let (moods, _, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    let state = moods.state();
    assert_eq!(state.entries.len(), 5);
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!((state.stats.average_mood - 4.6).abs() < 1e-9);
    assert_eq!(state.stats.most_frequent_mood, Mood::Happy);
    assert_eq!(state.stats.total_entries, 5);
    assert_eq!(state.stats.mood_distribution[&Mood::Good], 2);
    assert_eq!(state.stats.mood_distribution[&Mood::Happy], 3);
    // [4, 4, 5, 5, 5]: first half 4.0, second half 5.0.
    assert_eq!(state.stats.week_trend, WeekTrend::Up);
}

#[tokio::test]
async fn test_fetch_with_range() {
    let (moods, _, _) = session("2024-01-19", weekday_entries());
    moods
        .fetch_entries(Some(day("2024-01-16")), Some(day("2024-01-17")))
        .await;
    assert_eq!(ids(&moods.entries()), vec![2, 3]);
}

#[tokio::test]
async fn test_fetch_failure_records_error_and_keeps_snapshot() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    store.fail_next(1).await;
    moods.fetch_entries(None, None).await;

    let state = moods.state();
    assert_eq!(state.error.as_deref(), Some(FETCH_ERROR));
    assert!(!state.loading);
    assert_eq!(state.entries.len(), 5);

    // The next successful call clears the error.
    moods.fetch_entries(None, None).await;
    assert!(moods.error().is_none());
}

#[tokio::test]
async fn test_fetch_by_date_found_missing_and_invalid() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());

    moods.fetch_by_date("2024-01-17T08:00:00Z").await;
    assert_eq!(moods.current_mood().and_then(|e| e.id), Some(3));
    assert!(moods.error().is_none());

    moods.fetch_by_date("2024-02-01").await;
    assert!(moods.current_mood().is_none());
    assert!(moods.error().is_none());

    moods.fetch_by_date("someday").await;
    assert!(moods.error().is_some());
    assert!(!moods.loading());

    store.fail_next(1).await;
    moods.fetch_by_date("2024-01-15").await;
    assert_eq!(moods.error().as_deref(), Some(FETCH_BY_DATE_ERROR));
}

// ── Saving ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_save_on_new_day_creates_and_appends() {
    let (moods, store, _) = session("2024-01-20", weekday_entries());
    moods.fetch_entries(None, None).await;

    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-20", Mood::Sad).with_note("rainy"))
        .await
        .unwrap();

    assert!(!outcome.updated);
    assert_eq!(outcome.entry.id, Some(6));
    assert!(outcome.duplicates.deleted.is_empty());
    assert_eq!(ids(&moods.entries()), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(store.snapshot().await.len(), 6);
    assert_eq!(moods.stats().total_entries, 6);
}

#[tokio::test]
async fn test_save_on_existing_day_updates_in_place() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-17", Mood::Angry))
        .await
        .unwrap();

    assert!(outcome.updated);
    assert_eq!(outcome.entry.id, Some(3));
    assert_eq!(outcome.entry.mood, Mood::Angry);

    let entries = moods.entries();
    assert_eq!(ids(&entries), vec![1, 2, 3, 4, 5]);
    assert_eq!(entries[2].mood, Mood::Angry);
    assert_eq!(store.snapshot().await[2].mood, Mood::Angry);
    assert_eq!(moods.stats().mood_distribution[&Mood::Angry], 1);
}

#[tokio::test]
async fn test_save_updates_newest_and_removes_same_day_duplicates() {
    let entries = vec![
        entry(1, "2024-01-15", Mood::Sad),
        entry(7, "2024-01-15T09:00:00Z", Mood::Neutral),
        entry(4, "2024-01-15", Mood::Angry),
        entry(2, "2024-01-16", Mood::Good),
    ];
    let (moods, store, _) = session("2024-01-16", entries);
    moods.fetch_entries(None, None).await;

    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-15", Mood::Happy))
        .await
        .unwrap();

    assert_eq!(outcome.entry.id, Some(7));
    assert_eq!(outcome.duplicates.deleted, vec![1, 4]);
    assert!(outcome.duplicates.is_clean());
    assert_eq!(store.delete_log().await, vec![1, 4]);
    assert_eq!(ids(&moods.entries()), vec![7, 2]);
    assert!(!moods.loading());
}

#[tokio::test]
async fn test_save_reports_failed_duplicate_deletions() {
    let entries = vec![
        entry(1, "2024-01-15", Mood::Sad),
        entry(2, "2024-01-15", Mood::Sad),
        entry(3, "2024-01-15", Mood::Sad),
    ];
    let (moods, store, _) = session("2024-01-16", entries);
    moods.fetch_entries(None, None).await;
    store.fail_deletes_of(1).await;

    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-15", Mood::Good))
        .await
        .unwrap();

    assert_eq!(outcome.entry.id, Some(3));
    assert_eq!(outcome.duplicates.deleted, vec![2]);
    assert_eq!(outcome.duplicates.failed.len(), 1);
    assert_eq!(outcome.duplicates.failed[0].id, 1);
    assert_eq!(ids(&moods.entries()), vec![1, 3]);
    // Partial cleanup is not an operation failure.
    assert!(moods.error().is_none());
}

#[tokio::test]
async fn test_save_failure_records_and_returns_error() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;
    store.fail_next(1).await;

    let err = moods
        .save_mood(NewMoodEntry::new("2024-01-17", Mood::Sad))
        .await
        .unwrap_err();

    assert!(matches!(err, MoodError::Store(_)));
    assert_eq!(moods.error().as_deref(), Some(SAVE_ERROR));
    assert!(!moods.loading());
    assert_eq!(moods.entries()[2].mood, Mood::Happy);
}

#[tokio::test]
async fn test_resave_merges_optional_fields() {
    let (moods, _, _) = session("2024-01-20", Vec::new());
    moods
        .save_mood(
            NewMoodEntry::new("2024-01-20", Mood::Sad)
                .with_note("rainy")
                .with_intensity(3.0),
        )
        .await
        .unwrap();

    // Mood only: the earlier note and intensity stay.
    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-20", Mood::Good))
        .await
        .unwrap();
    assert_eq!(outcome.entry.mood, Mood::Good);
    assert_eq!(outcome.entry.note.as_deref(), Some("rainy"));
    assert_eq!(outcome.entry.intensity, Some(3.0));

    // A new note replaces the old one.
    let outcome = moods
        .save_mood(NewMoodEntry::new("2024-01-20", Mood::Good).with_note("sunny"))
        .await
        .unwrap();
    assert_eq!(outcome.entry.note.as_deref(), Some("sunny"));
    assert_eq!(moods.entries().len(), 1);
}

#[tokio::test]
async fn test_save_with_unusable_date_fails() {
    let (moods, _, _) = session("2024-01-19", Vec::new());
    let err = moods
        .save_mood(NewMoodEntry::new("tomorrow", Mood::Good))
        .await
        .unwrap_err();
    assert!(matches!(err, MoodError::InvalidDate(_)));
    assert_eq!(moods.error().as_deref(), Some(SAVE_ERROR));
    assert!(moods.entries().is_empty());
}

// ── Deleting ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_removes_from_snapshot() {
    let (moods, _, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    moods.delete_mood(3).await.unwrap();
    assert_eq!(ids(&moods.entries()), vec![1, 2, 4, 5]);
    assert_eq!(moods.stats().total_entries, 4);
}

#[tokio::test]
async fn test_delete_failure_is_recorded_and_reraised() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;
    store.fail_next(1).await;

    let err = moods.delete_mood(3).await.unwrap_err();
    assert!(matches!(err, MoodError::Store(_)));
    assert_eq!(moods.error().as_deref(), Some(DELETE_ERROR));
    assert_eq!(moods.entries().len(), 5);
}

// ── Cleanup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cleanup_keeps_highest_id_per_day() {
    let entries = vec![
        entry(3, "2024-01-15", Mood::Sad),
        entry(9, "2024-01-15", Mood::Good),
        entry(5, "2024-01-16", Mood::Happy),
        entry(2, "2024-01-17", Mood::Angry),
        entry(6, "2024-01-17", Mood::Neutral),
        entry(4, "2024-01-17", Mood::Neutral),
    ];
    let (moods, store, _) = session("2024-01-19", entries);
    moods.fetch_entries(None, None).await;

    let report = moods.cleanup_duplicates().await;

    assert_eq!(report.deleted_count(), 3);
    assert!(report.is_clean());
    let mut remaining = ids(&moods.entries());
    remaining.sort_unstable();
    assert_eq!(remaining, vec![5, 6, 9]);
    assert_eq!(store.snapshot().await.len(), 3);
}

#[tokio::test]
async fn test_cleanup_without_duplicates_touches_nothing() {
    let (moods, store, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    let report = moods.cleanup_duplicates().await;
    assert_eq!(report.deleted_count(), 0);
    assert!(store.delete_log().await.is_empty());
}

#[tokio::test]
async fn test_cleanup_continues_past_failures() {
    let entries = vec![
        entry(1, "2024-01-15", Mood::Sad),
        entry(2, "2024-01-15", Mood::Good),
        entry(3, "2024-01-16", Mood::Sad),
        entry(4, "2024-01-16", Mood::Good),
    ];
    let (moods, store, _) = session("2024-01-19", entries);
    moods.fetch_entries(None, None).await;
    store.fail_deletes_of(1).await;

    let report = moods.cleanup_duplicates().await;
    assert_eq!(report.deleted, vec![3]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(ids(&moods.entries()), vec![1, 2, 4]);
}

// ── Projections ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_week_moods_resolves_today_by_latest_start() {
    let entries = vec![
        // Today: the later start wins even though it is shorter.
        timed(1, "2024-01-17", Mood::Sad, "2024-01-17T08:00:00Z", "2024-01-17T20:00:00Z"),
        timed(2, "2024-01-17", Mood::Happy, "2024-01-17T11:00:00Z", "2024-01-17T11:05:00Z"),
        // Another day: the longer interval wins.
        timed(3, "2024-01-16", Mood::Sad, "2024-01-16T08:00:00Z", "2024-01-16T20:00:00Z"),
        timed(4, "2024-01-16", Mood::Happy, "2024-01-16T11:00:00Z", "2024-01-16T11:05:00Z"),
    ];
    let (moods, _, _) = session("2024-01-17", entries);
    moods.fetch_entries(None, None).await;

    let week = moods.week_moods();
    assert_eq!(week.len(), 7);
    assert_eq!(week[1].mood.as_ref().and_then(|e| e.id), Some(3));
    assert_eq!(week[2].mood.as_ref().and_then(|e| e.id), Some(2));
}

#[tokio::test]
async fn test_month_moods_follows_cursor() {
    let (moods, _, _) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;

    // January 2024 starts on a Monday.
    let month = moods.month_moods();
    assert_eq!(month.len(), 31);
    assert!(month[0].as_ref().and_then(|c| c.mood.as_ref()).is_none());
    assert!(month[14].as_ref().and_then(|c| c.mood.as_ref()).is_some());

    moods.next_month();
    let month = moods.month_moods();
    assert_eq!(month.iter().flatten().count(), 29);
    assert!(month.iter().flatten().all(|c| c.mood.is_none()));
}

#[tokio::test]
async fn test_navigation_recomputes_trend() {
    let entries = vec![
        entry(1, "2024-01-08", Mood::Happy),
        entry(2, "2024-01-09", Mood::Happy),
        entry(3, "2024-01-10", Mood::Sad),
        entry(4, "2024-01-11", Mood::Angry),
        entry(5, "2024-01-16", Mood::Neutral),
    ];
    let (moods, _, _) = session("2024-01-17", entries);
    moods.fetch_entries(None, None).await;
    assert_eq!(moods.stats().week_trend, WeekTrend::Stable);

    moods.previous_week();
    assert_eq!(moods.reference_date(), day("2024-01-10"));
    // [5, 5, 2, 1]: first half 5.0, second half 1.5.
    assert_eq!(moods.stats().week_trend, WeekTrend::Down);

    moods.set_week(day("2024-01-17"));
    assert_eq!(moods.stats().week_trend, WeekTrend::Stable);
}

// ── Today ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_has_entry_today_follows_clock() {
    let (moods, _, clock) = session("2024-01-19", weekday_entries());
    moods.fetch_entries(None, None).await;
    assert!(moods.has_entry_today());

    clock.advance(chrono::Duration::days(1));
    assert!(!moods.has_entry_today());
    assert!(moods.today_quote().is_none());
}

#[tokio::test]
async fn test_stats_follow_clock_past_midnight() {
    let entries = vec![
        entry(1, "2024-01-15", Mood::Good),
        entry(2, "2024-01-16", Mood::Good),
        timed(3, "2024-01-17", Mood::Angry, "2024-01-17T06:00:00Z", "2024-01-17T20:00:00Z"),
        timed(4, "2024-01-17", Mood::Happy, "2024-01-17T10:00:00Z", "2024-01-17T10:30:00Z"),
    ];
    let (moods, _, clock) = session("2024-01-17", entries);
    moods.fetch_entries(None, None).await;

    // Wednesday is today, so the latest start (happy) represents it: [4, 4, 5].
    assert_eq!(moods.stats().week_trend, WeekTrend::Stable);

    // On Thursday the longest entry (angry) does: [4, 4, 1].
    clock.advance(chrono::Duration::days(1));
    let week = moods.week_moods();
    assert_eq!(week[2].mood.as_ref().and_then(|e| e.id), Some(3));
    assert_eq!(moods.stats().week_trend, WeekTrend::Down);
    assert_eq!(moods.state().stats.week_trend, WeekTrend::Down);
}

#[tokio::test]
async fn test_today_quote_matches_today_mood() {
    let (moods, _, _) = session("2024-01-20", Vec::new());
    moods
        .save_mood(NewMoodEntry::new("2024-01-20", Mood::Good))
        .await
        .unwrap();

    let quote = moods.today_quote().unwrap();
    assert!(quotes(Mood::Good).contains(&quote));
}

#[tokio::test]
async fn test_today_honours_timezone() {
    let policy = DayPolicy::new("Pacific/Auckland", Default::default());
    let store = Arc::new(MemoryMoodStore::new(policy));
    // 20:00 UTC on the 19th is already the 20th in Auckland.
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 19, 20, 0, 0).unwrap()));
    let moods = MoodAggregator::new(store, clock, policy);
    assert_eq!(moods.today(), day("2024-01-20"));
    assert_eq!(moods.reference_date(), day("2024-01-20"));
}

// ── Observation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_subscriber_observes_fetch() {
    let (moods, _, _) = session("2024-01-19", weekday_entries());
    let mut rx = moods.subscribe();

    moods.fetch_entries(None, None).await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.entries.len(), 5);
    assert!(!seen.loading);
    assert_eq!(seen.stats.total_entries, 5);
}
