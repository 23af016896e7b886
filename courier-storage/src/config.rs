//! 存储访问层配置
//!
//! 从应用配置加载，环境变量优先（部署环境可在不改配置文件的
//! 情况下覆盖单项）。

use std::env;

use anyhow::Result;
use courier_core::config::AppConfig;
use scylla::statement::Consistency;
use tracing::warn;

/// 存储访问层配置
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub contact_points: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u32,
    pub connect_attempts: u32,
    pub connect_backoff_ms: u64,
    pub request_timeout_ms: u64,
    pub read_consistency: String,
    pub write_consistency: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub summary_retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub auto_init_schema: bool,
}

impl StorageConfig {
    /// 从应用配置加载，环境变量优先
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        let contact_points = env::var("STORAGE_CONTACT_POINTS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| app.cluster.contact_points.clone());

        let keyspace = env::var("STORAGE_KEYSPACE")
            .ok()
            .unwrap_or_else(|| app.cluster.keyspace.clone());

        let replication_factor = env::var("STORAGE_REPLICATION_FACTOR")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(app.cluster.replication_factor);

        let request_timeout_ms = env::var("STORAGE_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(app.cluster.request_timeout_ms);

        let read_consistency = env::var("STORAGE_READ_CONSISTENCY")
            .ok()
            .unwrap_or_else(|| app.consistency.read.clone());

        let write_consistency = env::var("STORAGE_WRITE_CONSISTENCY")
            .ok()
            .unwrap_or_else(|| app.consistency.write.clone());

        let auto_init_schema = env::var("STORAGE_AUTO_INIT_SCHEMA")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(app.writes.auto_init_schema);

        Ok(Self {
            contact_points,
            keyspace,
            replication_factor,
            connect_attempts: app.cluster.connect_attempts,
            connect_backoff_ms: app.cluster.connect_backoff_ms,
            request_timeout_ms,
            read_consistency,
            write_consistency,
            default_page_size: app.paging.default_page_size,
            max_page_size: app.paging.max_page_size,
            summary_retry_attempts: app.writes.summary_retry_attempts,
            retry_backoff_ms: app.writes.retry_backoff_ms,
            auto_init_schema,
        })
    }

    /// 读一致性级别（无法解析时回落到 LocalQuorum）
    pub fn read_consistency_level(&self) -> Consistency {
        resolve_consistency(&self.read_consistency)
    }

    /// 写一致性级别（无法解析时回落到 LocalQuorum）
    pub fn write_consistency_level(&self) -> Consistency {
        resolve_consistency(&self.write_consistency)
    }
}

fn resolve_consistency(raw: &str) -> Consistency {
    match parse_consistency(raw) {
        Some(level) => level,
        None => {
            warn!(consistency = raw, "unknown consistency level, using local_quorum");
            Consistency::LocalQuorum
        }
    }
}

fn parse_consistency(raw: &str) -> Option<Consistency> {
    match raw.to_ascii_lowercase().as_str() {
        "any" => Some(Consistency::Any),
        "one" => Some(Consistency::One),
        "two" => Some(Consistency::Two),
        "three" => Some(Consistency::Three),
        "quorum" => Some(Consistency::Quorum),
        "all" => Some(Consistency::All),
        "local_quorum" => Some(Consistency::LocalQuorum),
        "each_quorum" => Some(Consistency::EachQuorum),
        "local_one" => Some(Consistency::LocalOne),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_levels_parse_case_insensitively() {
        assert_eq!(parse_consistency("QUORUM"), Some(Consistency::Quorum));
        assert_eq!(parse_consistency("local_one"), Some(Consistency::LocalOne));
        assert_eq!(parse_consistency("nonsense"), None);
    }

    #[test]
    fn config_follows_app_config_defaults() {
        let config = StorageConfig::from_app_config(&AppConfig::default()).unwrap();
        assert_eq!(config.keyspace, "courier");
        assert_eq!(config.read_consistency_level(), Consistency::LocalQuorum);
        assert_eq!(config.max_page_size, 100);
    }
}
