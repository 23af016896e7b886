//! messages_by_conversation 表访问器
//!
//! 分区键 conversation_id，聚簇键 (created_at DESC, message_id DESC)。
//! 只暴露该键设计支持的操作：追加与按聚簇顺序的分页读取。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::error::StorageResult;
use scylla::client::session::Session;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::CqlTimeuuid;

use crate::config::StorageConfig;
use crate::domain::model::{ConversationId, Message, MessagePage, PageToken};
use crate::domain::repository::MessageLogRepository;

use super::helpers::{MessageRow, classify, deser_error};
use super::paging::{decode_token, encode_state};

const APPEND: &str = r#"
    INSERT INTO messages_by_conversation (
        conversation_id, created_at, message_id, sender_id, receiver_id, content
    ) VALUES (?, ?, ?, ?, ?, ?)
"#;

const PAGE: &str = r#"
    SELECT conversation_id, created_at, message_id, sender_id, receiver_id, content
    FROM messages_by_conversation
    WHERE conversation_id = ?
"#;

const PAGE_BEFORE: &str = r#"
    SELECT conversation_id, created_at, message_id, sender_id, receiver_id, content
    FROM messages_by_conversation
    WHERE conversation_id = ? AND created_at < ?
"#;

/// messages_by_conversation 的宽列存储实现
pub struct ScyllaMessageLog {
    session: Arc<Session>,
    append_stmt: PreparedStatement,
    page_stmt: PreparedStatement,
    page_before_stmt: PreparedStatement,
}

impl ScyllaMessageLog {
    pub async fn new(session: Arc<Session>, config: &StorageConfig) -> Result<Self> {
        let mut append_stmt = session
            .prepare(APPEND)
            .await
            .context("failed to prepare message append statement")?;
        append_stmt.set_consistency(config.write_consistency_level());

        let mut page_stmt = session
            .prepare(PAGE)
            .await
            .context("failed to prepare message page statement")?;
        page_stmt.set_consistency(config.read_consistency_level());

        let mut page_before_stmt = session
            .prepare(PAGE_BEFORE)
            .await
            .context("failed to prepare message page-before statement")?;
        page_before_stmt.set_consistency(config.read_consistency_level());

        Ok(Self {
            session,
            append_stmt,
            page_stmt,
            page_before_stmt,
        })
    }

    /// 以页大小为上限克隆语句（预编译语句的克隆只是配置拷贝）
    fn paged(base: &PreparedStatement, limit: usize) -> PreparedStatement {
        let mut stmt = base.clone();
        stmt.set_page_size(limit as i32);
        stmt
    }

    async fn run_page(
        &self,
        stmt: PreparedStatement,
        values: impl scylla::serialize::row::SerializeRow,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        let paging_state = decode_token(resume)?;
        let (result, paging_state_response) = self
            .session
            .execute_single_page(&stmt, values, paging_state)
            .await
            .map_err(classify)?;

        let rows = result.into_rows_result().map_err(deser_error)?;
        let mut items = Vec::with_capacity(rows.rows_num());
        for row in rows.rows::<MessageRow>().map_err(deser_error)? {
            items.push(Message::from(row.map_err(deser_error)?));
        }
        Ok(MessagePage {
            items,
            next: encode_state(paging_state_response),
        })
    }
}

#[async_trait]
impl MessageLogRepository for ScyllaMessageLog {
    async fn append(&self, message: &Message) -> StorageResult<()> {
        self.session
            .execute_unpaged(
                &self.append_stmt,
                (
                    message.conversation_id,
                    message.created_at,
                    CqlTimeuuid::from(message.message_id),
                    message.sender_id,
                    message.receiver_id,
                    message.content.as_str(),
                ),
            )
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn page(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        let stmt = Self::paged(&self.page_stmt, limit);
        self.run_page(stmt, (conversation_id,), resume).await
    }

    async fn page_before(
        &self,
        conversation_id: ConversationId,
        before: DateTime<Utc>,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        let stmt = Self::paged(&self.page_before_stmt, limit);
        self.run_page(stmt, (conversation_id, before), resume).await
    }
}
