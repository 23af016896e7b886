//! # Prometheus 指标收集模块
//!
//! 为存储访问层提供统一的 Prometheus 指标收集能力。

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// 全局指标注册表
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 存储访问层指标
pub struct StorageMetrics {
    /// 消息持久化总数
    pub messages_stored_total: IntCounter,
    /// 发送失败总数（源数据写入失败）
    pub sends_failed_total: IntCounter,
    /// 降级成功总数（消息已持久化，但部分摘要写入失败）
    pub sends_degraded_total: IntCounter,
    /// 发送耗时（秒）
    pub send_duration_seconds: Histogram,
    /// 分页读取总数
    pub page_reads_total: IntCounterVec,
    /// 游标解码失败总数
    pub cursor_decode_failure_total: IntCounter,
}

impl StorageMetrics {
    pub fn new() -> Self {
        let messages_stored_total = IntCounter::new(
            "messages_stored_total",
            "Total number of messages durably stored",
        )
        .expect("Failed to create messages_stored_total metric");

        let sends_failed_total = IntCounter::new(
            "sends_failed_total",
            "Total number of aborted sends (source-of-truth append failed)",
        )
        .expect("Failed to create sends_failed_total metric");

        let sends_degraded_total = IntCounter::new(
            "sends_degraded_total",
            "Total number of degraded sends (summary fan-out incomplete)",
        )
        .expect("Failed to create sends_degraded_total metric");

        let send_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("send_duration_seconds", "Send write path duration in seconds")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .expect("Failed to create send_duration_seconds metric");

        let page_reads_total = IntCounterVec::new(
            Opts::new("page_reads_total", "Total number of page reads"),
            &["table"],
        )
        .expect("Failed to create page_reads_total metric");

        let cursor_decode_failure_total = IntCounter::new(
            "cursor_decode_failure_total",
            "Total number of rejected paging cursors",
        )
        .expect("Failed to create cursor_decode_failure_total metric");

        // 注册指标，忽略重复注册错误（测试中可能会重复创建）
        let _ = REGISTRY.register(Box::new(messages_stored_total.clone()));
        let _ = REGISTRY.register(Box::new(sends_failed_total.clone()));
        let _ = REGISTRY.register(Box::new(sends_degraded_total.clone()));
        let _ = REGISTRY.register(Box::new(send_duration_seconds.clone()));
        let _ = REGISTRY.register(Box::new(page_reads_total.clone()));
        let _ = REGISTRY.register(Box::new(cursor_decode_failure_total.clone()));

        Self {
            messages_stored_total,
            sends_failed_total,
            sends_degraded_total,
            send_duration_seconds,
            page_reads_total,
            cursor_decode_failure_total,
        }
    }
}

impl Default for StorageMetrics {
    fn default() -> Self {
        Self::new()
    }
}
