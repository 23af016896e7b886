//! conversation_metadata 表访问器
//!
//! 单行分区：身份部分（参与者、创建时间）由 IF NOT EXISTS 幂等
//! 创建；最后一条消息摘要用条件写推进，时间戳不回退，乱序到达
//! 的旧消息不会覆盖更新的摘要。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::error::StorageResult;
use scylla::client::session::Session;
use scylla::statement::prepared::PreparedStatement;
use tracing::debug;

use crate::config::StorageConfig;
use crate::domain::model::{ConversationId, ConversationMetadata};
use crate::domain::repository::ConversationDirectoryRepository;

use super::helpers::{MetadataRow, classify, deser_error, lwt_applied};

const CREATE: &str = r#"
    INSERT INTO conversation_metadata (
        conversation_id, user_a_id, user_b_id, created_at, last_message_at, last_message_content
    ) VALUES (?, ?, ?, ?, null, null) IF NOT EXISTS
"#;

const GET: &str = r#"
    SELECT conversation_id, user_a_id, user_b_id, created_at, last_message_at, last_message_content
    FROM conversation_metadata
    WHERE conversation_id = ?
"#;

const ADVANCE: &str = r#"
    UPDATE conversation_metadata
    SET last_message_at = ?, last_message_content = ?
    WHERE conversation_id = ?
    IF last_message_at <= ?
"#;

const SEED: &str = r#"
    UPDATE conversation_metadata
    SET last_message_at = ?, last_message_content = ?
    WHERE conversation_id = ?
    IF last_message_at = null
"#;

/// conversation_metadata 的宽列存储实现
pub struct ScyllaConversationDirectory {
    session: Arc<Session>,
    create_stmt: PreparedStatement,
    get_stmt: PreparedStatement,
    advance_stmt: PreparedStatement,
    seed_stmt: PreparedStatement,
}

impl ScyllaConversationDirectory {
    pub async fn new(session: Arc<Session>, config: &StorageConfig) -> Result<Self> {
        let mut create_stmt = session
            .prepare(CREATE)
            .await
            .context("failed to prepare metadata create statement")?;
        create_stmt.set_consistency(config.write_consistency_level());

        let mut get_stmt = session
            .prepare(GET)
            .await
            .context("failed to prepare metadata get statement")?;
        get_stmt.set_consistency(config.read_consistency_level());

        let mut advance_stmt = session
            .prepare(ADVANCE)
            .await
            .context("failed to prepare metadata advance statement")?;
        advance_stmt.set_consistency(config.write_consistency_level());

        let mut seed_stmt = session
            .prepare(SEED)
            .await
            .context("failed to prepare metadata seed statement")?;
        seed_stmt.set_consistency(config.write_consistency_level());

        Ok(Self {
            session,
            create_stmt,
            get_stmt,
            advance_stmt,
            seed_stmt,
        })
    }
}

#[async_trait]
impl ConversationDirectoryRepository for ScyllaConversationDirectory {
    async fn create_if_absent(&self, metadata: &ConversationMetadata) -> StorageResult<bool> {
        let result = self
            .session
            .execute_unpaged(
                &self.create_stmt,
                (
                    metadata.conversation_id,
                    metadata.user_a,
                    metadata.user_b,
                    metadata.created_at,
                ),
            )
            .await
            .map_err(classify)?;
        lwt_applied(result)
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> StorageResult<Option<ConversationMetadata>> {
        let result = self
            .session
            .execute_unpaged(&self.get_stmt, (conversation_id,))
            .await
            .map_err(classify)?;
        let rows = result.into_rows_result().map_err(deser_error)?;
        let row = rows.maybe_first_row::<MetadataRow>().map_err(deser_error)?;
        Ok(row.map(ConversationMetadata::from))
    }

    async fn advance_last_message(
        &self,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
        content: &str,
    ) -> StorageResult<()> {
        // 常规路径：存量时间戳不更新时推进
        let result = self
            .session
            .execute_unpaged(&self.advance_stmt, (at, content, conversation_id, at))
            .await
            .map_err(classify)?;
        if lwt_applied(result)? {
            return Ok(());
        }

        // 首条消息：存量列还是 null，等值比较命中不了上面的条件
        let result = self
            .session
            .execute_unpaged(&self.seed_stmt, (at, content, conversation_id))
            .await
            .map_err(classify)?;
        if !lwt_applied(result)? {
            // 存量摘要更新，按不回退规则放弃本次推进
            debug!(conversation_id, "last-message advance skipped, stored summary is newer");
        }
        Ok(())
    }
}
