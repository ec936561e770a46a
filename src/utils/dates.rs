use crate::error::{AppError, AppResult};
use chrono::{Duration, NaiveDate};

/// 解析 YYYY-MM-DD，格式不对算调用方的错。
pub fn parse_date(input: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("Invalid date: {input}")))
}

/// 日期所在月份的键，形如 2025-06。
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// 月份键对应的 [月初, 下月初) 区间。
pub fn month_bounds(key: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::InvalidInput(format!("Invalid month: {key}"));

    if key.len() != 7 {
        return Err(invalid());
    }
    let (year_str, month_str) = key.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year_str.parse().map_err(|_| invalid())?;
    let month: u32 = month_str.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((first, next_first))
}

/// 往前数 days 天后所在月份的键。比这个键更早的缓存月份该清掉。
pub fn cutoff_month_key(today: NaiveDate, days: i64) -> String {
    month_key(today - Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-06-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
        );
        assert!(parse_date("2025/06/10").is_err());
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(month_key(date), "2025-06");
    }

    #[test]
    fn test_month_bounds() {
        let (first, next) = month_bounds("2025-06").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_december_rolls_over() {
        let (first, next) = month_bounds("2024-12").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_rejects_malformed() {
        assert!(month_bounds("2025-6").is_err());
        assert!(month_bounds("2025-00").is_err());
        assert!(month_bounds("202506").is_err());
        assert!(month_bounds("abcd-ef").is_err());
    }

    #[test]
    fn test_cutoff_month_key() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(cutoff_month_key(today, 90), "2025-03");
        assert_eq!(cutoff_month_key(today, 0), "2025-06");
    }

    #[test]
    fn test_month_key_string_order_matches_time_order() {
        // 零补位的 YYYY-MM 字典序就是时间序，淘汰逻辑依赖这一点
        assert!(month_key(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
            < month_key(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(month_key(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
            < month_key(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
    }
}
