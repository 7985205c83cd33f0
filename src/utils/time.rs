// src/utils/time.rs

//! Date and time parsing helpers.
//!
//! The portal renders dates in Spanish long form ("sábado, 11 de octubre
//! de 2025") and times as bare "HH:MM" text; timeline sections carry a
//! day-granular epoch timestamp.

use chrono::{DateTime, NaiveDate, Utc};

const SECS_PER_DAY: i64 = 86_400;

/// Parse an ISO "YYYY-MM-DD" date string.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Epoch seconds at midnight UTC of the given date.
pub fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// Whether two epoch timestamps fall on the same whole day.
///
/// Timeline sections only expose day-granular timestamps, so matching a
/// requested date must truncate, never compare exact seconds.
pub fn same_day(a: i64, b: i64) -> bool {
    a.div_euclid(SECS_PER_DAY) == b.div_euclid(SECS_PER_DAY)
}

/// Extract "(H)H:MM" from free text as an (hours, minutes) pair.
pub fn parse_time_of_day(text: &str) -> Option<(u32, u32)> {
    let re = regex::Regex::new(r"(\d{1,2}):(\d{2})").ok()?;
    let caps = re.captures(text)?;
    let hours: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

/// Combine a day-granular epoch with a time-of-day text into a full
/// timestamp. Unparsable time text leaves the day timestamp untouched.
pub fn combine_day_and_time(day_epoch: i64, time_text: &str) -> i64 {
    match parse_time_of_day(time_text) {
        Some((h, m)) => day_epoch + i64::from(h) * 3600 + i64::from(m) * 60,
        None => day_epoch,
    }
}

/// Convert a time-of-day text into an epoch on today's date, 0 when the
/// text carries no recognizable time.
pub fn time_text_to_today_epoch(text: &str) -> i64 {
    let Some((h, m)) = parse_time_of_day(text) else {
        return 0;
    };
    Utc::now()
        .date_naive()
        .and_hms_opt(h, m, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

/// ISO date string of an epoch timestamp.
pub fn epoch_to_date_string(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// Zero-padded "HH:MM" of an epoch timestamp.
pub fn epoch_to_time_string(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "00:00".to_string())
}

/// Convert a Spanish long date ("sábado, 11 de octubre de 2025") to ISO
/// "YYYY-MM-DD". Falls back to today when the text does not match, the
/// same recovery the portal's consumers always applied.
pub fn spanish_date_to_iso(text: &str) -> String {
    parse_spanish_date(text)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string())
}

/// Parse a Spanish long date, `None` when the shape does not match.
pub fn parse_spanish_date(text: &str) -> Option<NaiveDate> {
    let re = regex::Regex::new(r"(\d+)\s+de\s+(\p{L}+)\s+de\s+(\d+)").ok()?;
    let caps = re.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month = month_number(caps.get(2)?.as_str())?;
    let year: i32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2025-10-11"),
            NaiveDate::from_ymd_opt(2025, 10, 11)
        );
        assert!(parse_iso_date("11/10/2025").is_none());
    }

    #[test]
    fn test_same_day_truncates() {
        let midnight = date_to_epoch(NaiveDate::from_ymd_opt(2025, 10, 11).unwrap());
        assert!(same_day(midnight, midnight + 8 * 3600));
        assert!(same_day(midnight, midnight + SECS_PER_DAY - 1));
        assert!(!same_day(midnight, midnight + SECS_PER_DAY));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("14:30"), Some((14, 30)));
        assert_eq!(parse_time_of_day("Vence a las 8:05 hoy"), Some((8, 5)));
        assert_eq!(parse_time_of_day("99:99"), None);
        assert_eq!(parse_time_of_day("sin hora"), None);
    }

    #[test]
    fn test_combine_day_and_time() {
        let day = date_to_epoch(NaiveDate::from_ymd_opt(2025, 10, 11).unwrap());
        assert_eq!(combine_day_and_time(day, "14:30"), day + 14 * 3600 + 30 * 60);
        assert_eq!(combine_day_and_time(day, "???"), day);
    }

    #[test]
    fn test_epoch_round_trip_strings() {
        let day = date_to_epoch(NaiveDate::from_ymd_opt(2025, 10, 11).unwrap());
        let at = day + 9 * 3600 + 5 * 60;
        assert_eq!(epoch_to_date_string(at), "2025-10-11");
        assert_eq!(epoch_to_time_string(at), "09:05");
    }

    #[test]
    fn test_spanish_date_parsing() {
        assert_eq!(
            spanish_date_to_iso("sábado, 11 de octubre de 2025"),
            "2025-10-11"
        );
        assert_eq!(spanish_date_to_iso("1 de enero de 2026"), "2026-01-01");
        assert_eq!(
            parse_spanish_date("lunes, 3 de Marzo de 2025"),
            NaiveDate::from_ymd_opt(2025, 3, 3)
        );
        assert!(parse_spanish_date("11 de octubri de 2025").is_none());
    }

    #[test]
    fn test_spanish_date_fallback_is_today() {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(spanish_date_to_iso("fecha rara"), today);
    }
}
