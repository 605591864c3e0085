use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::error::{MoodError, Result};
use crate::models::Locale;

/// A day on the calendar, without time or zone.
pub type CalendarDay = NaiveDate;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── DayPolicy ─────────────────────────────────────────────────────────────────

/// The single place where strings become calendar days.
///
/// Entry `date` strings are read literally: the first ten characters are the
/// day as recorded, whatever offset follows them. The configured timezone
/// only decides what "today" is and how naive `beginAt` / `endAt` timestamps
/// are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPolicy {
    tz: Tz,
    locale: Locale,
}

impl Default for DayPolicy {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayPolicy {
    /// Create a policy for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str, locale: Locale) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "DayPolicy: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { tz, locale }
    }

    /// Strict variant of [`DayPolicy::new`]: unknown zones are an error.
    pub fn try_new(tz_name: &str, locale: Locale) -> Result<Self> {
        let tz = tz_name
            .parse::<Tz>()
            .map_err(|_| MoodError::InvalidTimezone(tz_name.to_string()))?;
        Ok(Self { tz, locale })
    }

    /// UTC days, English names.
    pub fn utc() -> Self {
        Self {
            tz: Tz::UTC,
            locale: Locale::En,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Reduce a date or timestamp string to its calendar day.
    ///
    /// Only the first ten characters are significant and they must be a
    /// `YYYY-MM-DD` day; anything after them is ignored. Leading whitespace
    /// is not skipped.
    pub fn normalize_day(&self, date: &str) -> Result<CalendarDay> {
        static DAY_PREFIX: OnceLock<Regex> = OnceLock::new();
        let re = DAY_PREFIX
            .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("regex is valid"));

        let prefix = re
            .captures(date)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| MoodError::InvalidDate(date.to_string()))?;

        NaiveDate::parse_from_str(prefix.as_str(), "%Y-%m-%d")
            .map_err(|_| MoodError::InvalidDate(date.to_string()))
    }

    /// The calendar day `now` falls on in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> CalendarDay {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string into a UTC [`DateTime`].
    ///
    /// Offset-less timestamps and bare days are read as wall-clock time in
    /// the configured zone. Returns `None` for empty strings or unrecognised
    /// formats.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];
        let naive = FMTS
            .iter()
            .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            });

        if let Some(naive) = naive {
            use chrono::TimeZone as _;
            if let Some(dt) = self.tz.from_local_datetime(&naive).earliest() {
                return Some(dt.with_timezone(&Utc));
            }
        }

        warn!("DayPolicy: could not parse timestamp \"{}\"", s);
        None
    }

    /// Abbreviated weekday name in the configured locale.
    pub fn day_name(&self, day: CalendarDay) -> &'static str {
        const EN: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        const FR: [&str; 7] = ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."];
        let idx = day.weekday().num_days_from_monday() as usize;
        match self.locale {
            Locale::En => EN[idx],
            Locale::Fr => FR[idx],
        }
    }
}

// ── Calendar arithmetic ───────────────────────────────────────────────────────

/// Canonical `YYYY-MM-DD` rendering of a day.
pub fn format_day(day: CalendarDay) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Monday of the ISO week containing `day` (Sunday belongs to the week that
/// started six days earlier).
pub fn week_start(day: CalendarDay) -> CalendarDay {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// The seven days of the Monday-aligned week containing `reference`.
pub fn week_days(reference: CalendarDay) -> [CalendarDay; 7] {
    let start = week_start(reference);
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// First day of the month containing `day`.
pub fn month_start(day: CalendarDay) -> CalendarDay {
    day.with_day(1).unwrap_or(day)
}

/// Number of days in the month containing `day`.
pub fn days_in_month(day: CalendarDay) -> u32 {
    let first = month_start(day);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Empty cells needed before day 1 in a Monday-first grid.
pub fn leading_placeholders(first_of_month: CalendarDay) -> usize {
    match first_of_month.weekday() {
        Weekday::Sun => 6,
        other => other.num_days_from_monday() as usize,
    }
}

/// Move `day` by a whole number of months, clamping the day of month to the
/// length of the target month.
pub fn shift_months(day: CalendarDay, months: i32) -> CalendarDay {
    let shifted = if months >= 0 {
        day.checked_add_months(Months::new(months as u32))
    } else {
        day.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(day)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
