// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Due-date normalization and Russian display formatting.
//!
//! All relative dates resolve against "today" in a fixed reference offset
//! (`session.utc_offset_minutes`, Moscow time by default).

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Builds the reference offset, falling back to UTC for out-of-range input.
pub fn reference_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// The calendar date at `now` in the reference offset.
pub fn today_in(offset: FixedOffset, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Turns a relative due date into `YYYY-MM-DD`.
///
/// `today`, `tomorrow` and English or Russian weekday names resolve against
/// `today`; a weekday always means its next occurrence, so naming today's
/// weekday rolls a full week. Anything else passes through unchanged.
pub fn convert_to_due_iso(due: &str, today: NaiveDate) -> String {
    let trimmed = due.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let key = trimmed.to_lowercase();
    let resolved = match key.as_str() {
        "today" | "сегодня" => Some(today),
        "tomorrow" | "завтра" => Some(today + Duration::days(1)),
        other => weekday_from_name(other).map(|w| next_weekday(today, w)),
    };

    match resolved {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => trimmed.to_string(),
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name {
        "monday" | "mon" | "понедельник" => Weekday::Mon,
        "tuesday" | "tue" | "вторник" => Weekday::Tue,
        "wednesday" | "wed" | "среда" => Weekday::Wed,
        "thursday" | "thu" | "четверг" => Weekday::Thu,
        "friday" | "fri" | "пятница" => Weekday::Fri,
        "saturday" | "sat" | "суббота" => Weekday::Sat,
        "sunday" | "sun" | "воскресенье" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_monday());
    let wanted = i64::from(target.num_days_from_monday());
    let mut days = wanted - current;
    if days <= 0 {
        days += 7;
    }
    today + Duration::days(days)
}

/// Renders an ISO date as e.g. `17 октября (Суббота)`. Anything that is not
/// a plain ISO date is returned verbatim.
pub fn format_due_for_display(due: &str) -> String {
    let Ok(date) = NaiveDate::parse_from_str(due.trim(), "%Y-%m-%d") else {
        return due.to_string();
    };
    format!(
        "{} {} ({})",
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize],
        weekday_name_ru(date.weekday())
    )
}

fn weekday_name_ru(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Понедельник",
        Weekday::Tue => "Вторник",
        Weekday::Wed => "Среда",
        Weekday::Thu => "Четверг",
        Weekday::Fri => "Пятница",
        Weekday::Sat => "Суббота",
        Weekday::Sun => "Воскресенье",
    }
}
