//! Calendar helpers working in a user's timezone

use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::constants::DATETIME_FORMAT;
use crate::errors::{KimaiError, Result};

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| KimaiError::InvalidInput(format!("Unknown timezone: {name}")))
}

/// Resolve a wall-clock time in `tz` to UTC.
///
/// Ambiguous times pick the earlier instant; times inside a DST gap are
/// moved forward by one hour.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => {
            let shifted = local + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| Utc.from_utc_datetime(&local), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS` as wall-clock time in `tz`.
pub fn parse_local_datetime(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).map_err(|_| {
        KimaiError::InvalidInput(format!(
            "Invalid date format \"{value}\", expected YYYY-MM-DDTHH:MM:SS"
        ))
    })?;
    Ok(local_to_utc(local, tz))
}

/// Format an instant as local wall-clock time in `tz`.
pub fn format_local_datetime(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DATETIME_FORMAT).to_string()
}

pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// Last second of `date` in `tz`.
pub fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    local_to_utc(date.and_time(last), tz)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next.and_then(|n| n.pred_opt()).unwrap_or(first);
    (first, last)
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(date.weekday().num_days_from_monday());
    let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN);
    (monday, monday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX))
}

/// First and last day of the quarter containing `date`.
pub fn quarter_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first_month = (date.month0() / 3) * 3 + 1;
    let first = NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date);
    let last_month = NaiveDate::from_ymd_opt(date.year(), first_month + 2, 1).unwrap_or(first);
    (first, month_bounds(last_month).1)
}

/// Every day from `begin` to `end`, both inclusive.
pub fn days_between(begin: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    begin.iter_days().take_while(|day| *day <= end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_and_quarter_bounds() {
        assert_eq!(month_bounds(date(2024, 2, 14)), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(date(2023, 12, 31)), (date(2023, 12, 1), date(2023, 12, 31)));
        assert_eq!(quarter_bounds(date(2024, 5, 3)), (date(2024, 4, 1), date(2024, 6, 30)));
        assert_eq!(quarter_bounds(date(2024, 12, 3)), (date(2024, 10, 1), date(2024, 12, 31)));
    }

    #[test]
    fn weeks_start_on_monday() {
        assert_eq!(week_bounds(date(2024, 3, 14)), (date(2024, 3, 11), date(2024, 3, 17)));
        assert_eq!(week_bounds(date(2024, 3, 11)), (date(2024, 3, 11), date(2024, 3, 17)));
        assert_eq!(week_bounds(NaiveDate::MAX).1, NaiveDate::MAX);
        assert_eq!(days_between(date(2024, 3, 11), date(2024, 3, 17)).len(), 7);
    }

    #[test]
    fn local_times_convert_through_the_timezone() {
        let tz = parse_timezone("Europe/Berlin").unwrap();
        let utc = parse_local_datetime("2024-07-01T10:00:00", tz).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-07-01T08:00:00+00:00");
        assert_eq!(format_local_datetime(utc, tz), "2024-07-01T10:00:00");
        assert!(parse_local_datetime("01.07.2024", tz).is_err());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
