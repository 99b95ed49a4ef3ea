//! 时间工具函数 — 业务时区转换
//!
//! 审批快照的日期/月份统一用固定业务时区计算，
//! repository 层只接收 `i64` Unix millis。

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

/// Local calendar date of a Unix-millis instant in the business time zone.
pub fn local_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Format a date as the approval snapshot stores it (`YYYY-MM-DD`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a month key (`YYYY-MM`).
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse a stored `YYYY-MM-DD` approval date back into (year, month).
pub fn year_month(date_key: &str) -> Option<(i64, i64)> {
    let date = NaiveDate::parse_from_str(date_key, "%Y-%m-%d").ok()?;
    Some((date.year() as i64, date.month() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_date_crosses_midnight() {
        // 2026-03-01 23:30 UTC is already 2026-03-02 in Bangkok (UTC+7)
        let millis = chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let date = local_date(millis, chrono_tz::Asia::Bangkok).unwrap();
        assert_eq!(date_key(date), "2026-03-02");
        assert_eq!(month_key(date), "2026-03");
    }

    #[test]
    fn test_year_month_roundtrip() {
        assert_eq!(year_month("2026-07-31"), Some((2026, 7)));
        assert_eq!(year_month("not-a-date"), None);
    }
}
