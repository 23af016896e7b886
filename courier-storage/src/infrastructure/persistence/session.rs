//! 存储集群会话引导
//!
//! 带重试的集群连接：部署中集群可能后于本服务就绪，
//! 在放弃之前按配置的次数与间隔反复尝试。

use std::time::Duration;

use anyhow::{Context, Result};
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use tracing::{info, warn};

use crate::config::StorageConfig;

/// 连接集群并返回可并发共享的会话
pub async fn connect(config: &StorageConfig) -> Result<Session> {
    let profile = ExecutionProfile::builder()
        .request_timeout(Some(Duration::from_millis(config.request_timeout_ms)))
        .build();
    let handle = profile.into_handle();

    let mut attempt = 1;
    loop {
        let result = SessionBuilder::new()
            .known_nodes(&config.contact_points)
            .default_execution_profile_handle(handle.clone())
            .build()
            .await;

        match result {
            Ok(session) => {
                info!(
                    contact_points = ?config.contact_points,
                    "connected to storage cluster"
                );
                return Ok(session);
            }
            Err(err) if attempt < config.connect_attempts => {
                warn!(
                    error = %err,
                    attempt,
                    "storage cluster not reachable, retrying"
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(config.connect_backoff_ms)).await;
            }
            Err(err) => {
                return Err(err).context("failed to connect to storage cluster");
            }
        }
    }
}
