//! Courier 配置模块
//!
//! 提供应用程序配置的加载和解析：
//! - TOML 配置文件加载（路径来自参数或 COURIER_CONFIG 环境变量）
//! - 各分区的默认值
//! - 全局配置实例（进程内只初始化一次）

use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 默认配置文件路径
const DEFAULT_CONFIG_PATH: &str = "config/courier.toml";

/// 集群连接配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// 节点地址列表
    pub contact_points: Vec<String>,
    /// 键空间名称
    pub keyspace: String,
    /// 副本因子（SimpleStrategy）
    pub replication_factor: u32,
    /// 集群连接重试次数
    pub connect_attempts: u32,
    /// 连接重试间隔（毫秒）
    pub connect_backoff_ms: u64,
    /// 单次请求超时（毫秒）
    pub request_timeout_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            contact_points: vec!["127.0.0.1:9042".to_string()],
            keyspace: "courier".to_string(),
            replication_factor: 3,
            connect_attempts: 10,
            connect_backoff_ms: 3000,
            request_timeout_ms: 5000,
        }
    }
}

/// 读写一致性级别配置
///
/// 在可用性与新鲜度之间按操作调节
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// 读一致性级别
    pub read: String,
    /// 写一致性级别
    pub write: String,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            read: "local_quorum".to_string(),
            write: "local_quorum".to_string(),
        }
    }
}

/// 分页配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// 默认页大小
    pub default_page_size: u32,
    /// 最大页大小
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// 写入路径配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// 幂等步骤（lookup 回写、摘要覆盖写）的瞬时失败重试次数
    pub summary_retry_attempts: u32,
    /// 重试退避间隔（毫秒）
    pub retry_backoff_ms: u64,
    /// 启动时按需创建键空间与表结构
    pub auto_init_schema: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            summary_retry_attempts: 1,
            retry_backoff_ms: 50,
            auto_init_schema: true,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cluster: ClusterConfig,
    pub consistency: ConsistencyConfig,
    pub paging: PagingConfig,
    pub writes: WriteConfig,
}

impl AppConfig {
    /// 从 TOML 文本解析配置
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse configuration")
    }

    /// 从文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file: {}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}

/// 加载全局配置
///
/// 路径解析顺序：显式参数 > COURIER_CONFIG 环境变量 > 默认路径。
/// 文件缺失时回落到默认配置并记录警告，不中断启动。
pub fn load_config(path: Option<&str>) -> &'static AppConfig {
    APP_CONFIG.get_or_init(|| {
        let path = path
            .map(str::to_string)
            .or_else(|| env::var("COURIER_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    config_path = %path,
                    error = %err,
                    "configuration file not loaded, falling back to defaults"
                );
                AppConfig::default()
            }
        }
    })
}

/// 获取已加载的全局配置（未显式加载时使用默认路径）
pub fn app_config() -> &'static AppConfig {
    load_config(None)
}
