//! 时间工具函数 — 业务时区转换
//!
//! The engine stores and compares `i64` Unix millis; calendar reasoning
//! (cycle windows, months at a level) happens in the business timezone.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Unix millis → local date-time in the business timezone
///
/// Out-of-range millis clamp to the Unix epoch.
pub fn local_datetime(millis: i64, tz: Tz) -> DateTime<Tz> {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&tz)
}

/// Unix millis → calendar date in the business timezone
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    local_datetime(millis, tz).date_naive()
}

/// 本地时间 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn local_to_millis(naive: NaiveDateTime, tz: Tz) -> i64 {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    local_to_millis(date.and_time(NaiveTime::MIN), tz)
}

/// Whole calendar months elapsed from `from` to `to` (0 when `to <= from`)
///
/// A month counts once the same day-of-month and time has been reached;
/// Jan 31 plus one month is the last day of February.
pub fn months_between(from: i64, to: i64, tz: Tz) -> u32 {
    if to <= from {
        return 0;
    }
    let start = local_datetime(from, tz).naive_local();
    let end = local_datetime(to, tz).naive_local();

    let raw = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if raw <= 0 {
        return 0;
    }
    let mut months = raw as u32;
    if start
        .checked_add_months(Months::new(months))
        .is_some_and(|anniversary| anniversary > end)
    {
        months -= 1;
    }
    months
}
