//! Plain-text rendering of the week, month, stats and cleanup views.
//!
//! Emoji are two columns wide in most terminals, so every cell is padded by
//! display width rather than by `char` count.

use chrono::Datelike;
use moodflow_core::models::{DayCell, Locale, Mood, MoodStats};
use moodflow_core::time_utils::{format_day, month_start, week_days, CalendarDay, DayPolicy};
use moodflow_data::aggregator::CleanupReport;
use unicode_width::UnicodeWidthStr;

/// Display width of one month-grid column.
const MONTH_COLUMN: usize = 6;

/// Widest distribution bar in the stats view.
const BAR_WIDTH: usize = 20;

/// Right-pad `text` with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

// ── Week ──────────────────────────────────────────────────────────────────────

/// One line per day: weekday, date, mood and note. Today is marked with `*`.
pub fn render_week(cells: &[DayCell], today: CalendarDay, locale: Locale) -> String {
    let mut out = String::new();
    if let Some(first) = cells.first() {
        out.push_str(&format!("Week of {}\n", format_day(first.date)));
    }

    for cell in cells {
        let marker = if cell.date == today { "*" } else { " " };
        let mood = match &cell.mood {
            Some(entry) => format!("{} {}", entry.mood.emoji(), entry.mood.label(locale)),
            None => "·".to_string(),
        };
        let note = cell
            .mood
            .as_ref()
            .and_then(|e| e.note.as_deref())
            .unwrap_or_default();

        let line = format!(
            "{marker} {} {}  {}{}",
            pad(&cell.day_name, 4),
            format_day(cell.date),
            pad(&mood, 16),
            note
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

// ── Month ─────────────────────────────────────────────────────────────────────

/// Monday-first calendar grid; leading placeholders render as blanks.
pub fn render_month(cells: &[Option<DayCell>], reference: CalendarDay, policy: &DayPolicy) -> String {
    let mut out = format!("{}\n", month_start(reference).format("%Y-%m"));

    let header: String = week_days(month_start(reference))
        .iter()
        .map(|&d| pad(policy.day_name(d), MONTH_COLUMN))
        .collect();
    out.push_str(header.trim_end());
    out.push('\n');

    for row in cells.chunks(7) {
        let line: String = row
            .iter()
            .map(|cell| match cell {
                Some(cell) => {
                    let mark = cell.mood.as_ref().map_or("·", |e| e.mood.emoji());
                    pad(&format!("{:>2} {mark}", cell.date.day()), MONTH_COLUMN)
                }
                None => pad("", MONTH_COLUMN),
            })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

// ── Stats ─────────────────────────────────────────────────────────────────────

pub fn render_stats(stats: &MoodStats, locale: Locale) -> String {
    let mut out = String::new();
    out.push_str(&format!("Entries:        {}\n", stats.total_entries));
    out.push_str(&format!("Average mood:   {:.1} / 5\n", stats.average_mood));
    out.push_str(&format!(
        "Most frequent:  {} {}\n",
        stats.most_frequent_mood.emoji(),
        stats.most_frequent_mood.label(locale)
    ));
    out.push_str(&format!("Week trend:     {}\n", stats.week_trend));
    out.push('\n');

    let widest = stats.mood_distribution.values().copied().max().unwrap_or(0);
    for mood in Mood::ALL {
        let count = stats.mood_distribution.get(&mood).copied().unwrap_or(0);
        let bar = if widest == 0 { 0 } else { count * BAR_WIDTH / widest };
        let line = format!(
            "{} {} {:>3} {}",
            mood.emoji(),
            pad(mood.label(locale), 14),
            count,
            "█".repeat(bar)
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

// ── Cleanup ───────────────────────────────────────────────────────────────────

pub fn render_cleanup(report: &CleanupReport) -> String {
    if report.deleted.is_empty() && report.failed.is_empty() {
        return "No duplicate entries found.\n".to_string();
    }

    let mut out = format!("Removed {} duplicate entries.\n", report.deleted_count());
    for failure in &report.failed {
        out.push_str(&format!("  could not remove #{}: {}\n", failure.id, failure.error));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use moodflow_core::models::MoodEntry;
    use moodflow_data::aggregator::FailedDeletion;
    use moodflow_data::projection::{month_view, week_view};

    fn day(s: &str) -> CalendarDay {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(id: i64, date: &str, mood: Mood, note: Option<&str>) -> MoodEntry {
        MoodEntry {
            id: Some(id),
            date: date.to_string(),
            mood,
            note: note.map(str::to_string),
            intensity: None,
            begin_at: None,
            end_at: None,
        }
    }

    #[test]
    fn test_pad_counts_emoji_as_two_columns() {
        assert_eq!(pad("😄", 4), "😄  ");
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }

    // ── week ──────────────────────────────────────────────────────────────

    #[test]
    fn test_render_week_lists_seven_days() {
        let policy = DayPolicy::utc();
        let entries = vec![entry(1, "2024-01-16", Mood::Good, Some("walk"))];
        let cells = week_view(&entries, day("2024-01-16"), day("2024-01-16"), &policy);

        let text = render_week(&cells, day("2024-01-16"), Locale::En);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Week of 2024-01-15");
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("  Mon  2024-01-15"));
        assert!(lines[2].starts_with("* Tue  2024-01-16"));
        assert!(lines[2].contains("🙂 Good"));
        assert!(lines[2].ends_with("walk"));
    }

    // ── month ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_month_grid() {
        let policy = DayPolicy::utc();
        let entries = vec![entry(1, "2024-05-01", Mood::Happy, None)];
        let cells = month_view(&entries, day("2024-05-20"), &policy);

        let text = render_month(&cells, day("2024-05-20"), &policy);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "2024-05");
        assert!(lines[1].starts_with("Mon   Tue"));
        // Two blank columns before Wednesday the 1st.
        assert!(lines[2].starts_with(&format!("{} 1 😄", " ".repeat(2 * MONTH_COLUMN))));
        // 2 placeholders + 31 days = 33 cells = 5 rows.
        assert_eq!(lines.len(), 2 + 5);
    }

    // ── stats ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_stats_empty() {
        let text = render_stats(&MoodStats::default(), Locale::En);
        assert!(text.contains("Entries:        0"));
        assert!(text.contains("Average mood:   0.0 / 5"));
        assert!(text.contains("Neutral"));
        assert!(text.contains("Week trend:     stable"));
        assert!(!text.contains('█'));
    }

    #[test]
    fn test_render_stats_french_labels() {
        let mut stats = MoodStats::default();
        stats.most_frequent_mood = Mood::Sad;
        let text = render_stats(&stats, Locale::Fr);
        assert!(text.contains("😢 Triste"));
    }

    // ── cleanup ───────────────────────────────────────────────────────────

    #[test]
    fn test_render_cleanup() {
        assert_eq!(
            render_cleanup(&CleanupReport::default()),
            "No duplicate entries found.\n"
        );

        let report = CleanupReport {
            deleted: vec![1, 2],
            failed: vec![FailedDeletion {
                id: 3,
                error: "Transport error: offline".to_string(),
            }],
        };
        let text = render_cleanup(&report);
        assert!(text.starts_with("Removed 2 duplicate entries."));
        assert!(text.contains("#3: Transport error: offline"));
    }
}
