//! 消息 id 生成器
//!
//! 生成 v1 风格的 timeuuid：高位是消息的 created_at 时间戳，
//! 同一毫秒内通过亚毫秒计数与时钟序列保持唯一，满足聚簇键
//! (created_at, message_id) 的唯一性要求。

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Utc};
use rand::RngCore;
use uuid::{Context, Timestamp, Uuid};

use crate::domain::repository::MessageIdGenerator;

/// 基于 timeuuid 的消息 id 生成器
pub struct TimeuuidGenerator {
    node_id: [u8; 6],
    context: Context,
    sub_ms: AtomicU16,
}

impl TimeuuidGenerator {
    /// 使用进程级随机节点 id 创建生成器
    pub fn new() -> Self {
        let mut node_id = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut node_id);
        // RFC 4122 的多播位，标记为非硬件地址
        node_id[0] |= 0x01;
        Self {
            node_id,
            context: Context::new(rand::random()),
            sub_ms: AtomicU16::new(0),
        }
    }
}

impl Default for TimeuuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageIdGenerator for TimeuuidGenerator {
    fn next_id(&self, at: DateTime<Utc>) -> Uuid {
        let millis = at.timestamp_millis();
        let secs = millis.div_euclid(1000) as u64;
        // 同一毫秒内的连续生成落在不同的 100ns 槽位，
        // 使同时间戳的 id 在 timeuuid 序上仍然递增
        let slot = self.sub_ms.fetch_add(1, Ordering::Relaxed) % 10_000;
        let nanos = (millis.rem_euclid(1000) as u32) * 1_000_000 + u32::from(slot) * 100;
        let ts = Timestamp::from_unix(&self.context, secs, nanos);
        Uuid::new_v1(ts, &self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn ids_are_version_1() {
        let generator = TimeuuidGenerator::new();
        let id = generator.next_id(Utc::now());
        assert_eq!(id.get_version_num(), 1);
    }

    #[test]
    fn identical_timestamps_still_yield_unique_ids() {
        let generator = TimeuuidGenerator::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let ids: HashSet<Uuid> = (0..1000).map(|_| generator.next_id(at)).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn id_timestamps_follow_created_at() {
        let generator = TimeuuidGenerator::new();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let t2 = t1 + chrono::Duration::milliseconds(5);

        let id1 = generator.next_id(t1);
        let id2 = generator.next_id(t2);

        let ticks = |id: &Uuid| {
            let ts = id.get_timestamp().unwrap();
            let (secs, nanos) = ts.to_unix();
            secs * 1_000_000_000 + u64::from(nanos)
        };
        assert!(ticks(&id2) > ticks(&id1));
    }

    #[test]
    fn same_millisecond_ids_are_ordered_by_generation() {
        let generator = TimeuuidGenerator::new();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let first = generator.next_id(at);
        let second = generator.next_id(at);

        let ticks = |id: &Uuid| {
            let ts = id.get_timestamp().unwrap();
            let (secs, nanos) = ts.to_unix();
            secs * 1_000_000_000 + u64::from(nanos)
        };
        assert!(ticks(&second) > ticks(&first));
    }
}
