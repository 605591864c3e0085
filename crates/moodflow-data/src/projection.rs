//! Week and month grids built from a flat entry list.

use chrono::Duration;
use moodflow_core::models::{DayCell, MoodEntry};
use moodflow_core::time_utils::{
    days_in_month, leading_placeholders, month_start, week_days, CalendarDay, DayPolicy,
};

use crate::aggregator::DayAggregator;

/// The Monday-aligned week containing `reference`, one cell per day.
///
/// Each day shows its representative entry as chosen by
/// [`DayAggregator::representative`], so duplicates resolve differently for
/// `today` than for other days.
pub fn week_view(
    entries: &[MoodEntry],
    reference: CalendarDay,
    today: CalendarDay,
    policy: &DayPolicy,
) -> Vec<DayCell> {
    week_days(reference)
        .into_iter()
        .map(|date| DayCell {
            date,
            day_name: policy.day_name(date).to_string(),
            mood: DayAggregator::representative(entries, date, today, policy).cloned(),
        })
        .collect()
}

/// The month containing `reference` laid out on a Monday-first grid.
///
/// Leading `None`s pad the first row so day 1 sits under its weekday. Days
/// use the first matching entry; duplicates are not resolved here.
pub fn month_view(
    entries: &[MoodEntry],
    reference: CalendarDay,
    policy: &DayPolicy,
) -> Vec<Option<DayCell>> {
    let first = month_start(reference);
    let padding = leading_placeholders(first);
    let length = days_in_month(first);

    let mut cells: Vec<Option<DayCell>> = Vec::with_capacity(padding + length as usize);
    cells.extend(std::iter::repeat(None).take(padding));

    for offset in 0..length {
        let date = first + Duration::days(offset as i64);
        cells.push(Some(DayCell {
            date,
            day_name: policy.day_name(date).to_string(),
            mood: DayAggregator::first_match(entries, date, policy).cloned(),
        }));
    }

    cells
}
