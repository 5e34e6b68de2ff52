//! 时间工具函数 (业务时区转换)
//!
//! 所有时间戳统一为 Unix millis (`i64`)，日期边界按业务时区计算。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 当前时间 (Unix millis)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unix millis → 业务时区日期
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&tz)
        .date_naive()
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
///
/// DST gap fallback: 本地零点不存在时按 UTC 计算。
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// 查询参数中的日期区间 → `[start, end)` millis
///
/// `end_date` 包含当天 (转为次日零点)。
pub fn date_range_millis(
    start_date: Option<&str>,
    end_date: Option<&str>,
    tz: Tz,
) -> AppResult<(Option<i64>, Option<i64>)> {
    let start = start_date
        .map(parse_date)
        .transpose()?
        .map(|d| day_start_millis(d, tz));
    let end = end_date
        .map(parse_date)
        .transpose()?
        .map(|d| day_end_millis(d, tz));

    if let (Some(s), Some(e)) = (start, end)
        && s >= e
    {
        return Err(AppError::validation("startDate must not be after endDate"));
    }
    Ok((start, end))
}
