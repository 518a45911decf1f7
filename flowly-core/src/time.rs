//! Time utilities: timezone-aware deadlines and workday windows.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a wall-clock time like "09:00".
pub fn parse_clock_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid time of day '{s}' (expected HH:MM): {e}"))
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let ndt = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Calendar date of `now` as seen in `tz`.
pub fn local_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Resolve the start of the workday on `day` in `tz`.
///
/// Ambiguous local times (DST fall-back) take the earlier instant; local times
/// that do not exist (spring-forward gap) move forward by an hour.
pub fn workday_start(day: NaiveDate, start: NaiveTime, tz: Tz) -> DateTime<Tz> {
    let ndt = day.and_time(start);
    tz.from_local_datetime(&ndt)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(ndt + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&ndt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_chicago_deadline() {
        // Feb is CST (UTC-6)
        let utc =
            parse_local_deadline_to_utc("2026-02-20 23:59", chrono_tz::America::Chicago).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn local_day_follows_timezone() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 3, 30, 0).unwrap();
        let chicago = parse_timezone("America/Chicago").unwrap();
        assert_eq!(local_day(now, chicago), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(local_day(now, Tz::UTC), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn workday_start_skips_spring_forward_gap() {
        // 2026-03-08 02:30 does not exist in Chicago.
        let day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let start = workday_start(
            day,
            parse_clock_time("02:30").unwrap(),
            chrono_tz::America::Chicago,
        );
        assert_eq!(start.hour(), 3);
        assert_eq!(start.minute(), 30);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert!(parse_clock_time("9am").is_err());
    }
}
