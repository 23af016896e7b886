//! 日志初始化模块

use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志输出
///
/// 过滤级别优先取 RUST_LOG 环境变量，否则使用给定的默认级别。
/// 重复调用是安全的（只有第一次生效）。
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
