//! 工具函数模块
//!
//! 提供毫秒时间戳与 DateTime 之间的转换

use chrono::{DateTime, TimeZone, Utc};

/// 当前时间的毫秒时间戳
pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 毫秒时间戳转 DateTime
pub fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// 将时间截断到毫秒精度
///
/// 存储列的时间精度是毫秒；生成时先截断，所有反规范化副本
/// 之间以及与读取结果之间才能精确相等
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    millis_to_datetime(ts.timestamp_millis()).unwrap_or(ts)
}
