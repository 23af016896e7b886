//! conversations_by_user 表访问器
//!
//! 分区键 user_id，聚簇键 (last_message_at DESC, conversation_id DESC)。
//! 覆盖写走普通 INSERT：同键写入按存储的最后写入者胜出规则解决冲突。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use courier_core::error::StorageResult;
use scylla::client::session::Session;
use scylla::statement::prepared::PreparedStatement;

use crate::config::StorageConfig;
use crate::domain::model::{ConversationSummary, PageToken, SummaryPage, UserId};
use crate::domain::repository::ConversationSummaryRepository;

use super::helpers::{SummaryRow, classify, deser_error};
use super::paging::{decode_token, encode_state};

const UPSERT: &str = r#"
    INSERT INTO conversations_by_user (
        user_id, last_message_at, conversation_id, other_user_id, last_message_content
    ) VALUES (?, ?, ?, ?, ?)
"#;

const PAGE: &str = r#"
    SELECT conversation_id, other_user_id, last_message_at, last_message_content
    FROM conversations_by_user
    WHERE user_id = ?
"#;

/// conversations_by_user 的宽列存储实现
pub struct ScyllaConversationSummaries {
    session: Arc<Session>,
    upsert_stmt: PreparedStatement,
    page_stmt: PreparedStatement,
}

impl ScyllaConversationSummaries {
    pub async fn new(session: Arc<Session>, config: &StorageConfig) -> Result<Self> {
        let mut upsert_stmt = session
            .prepare(UPSERT)
            .await
            .context("failed to prepare summary upsert statement")?;
        upsert_stmt.set_consistency(config.write_consistency_level());

        let mut page_stmt = session
            .prepare(PAGE)
            .await
            .context("failed to prepare summary page statement")?;
        page_stmt.set_consistency(config.read_consistency_level());

        Ok(Self {
            session,
            upsert_stmt,
            page_stmt,
        })
    }
}

#[async_trait]
impl ConversationSummaryRepository for ScyllaConversationSummaries {
    async fn upsert(&self, user_id: UserId, summary: &ConversationSummary) -> StorageResult<()> {
        self.session
            .execute_unpaged(
                &self.upsert_stmt,
                (
                    user_id,
                    summary.last_message_at,
                    summary.conversation_id,
                    summary.other_user_id,
                    summary.last_message_content.as_str(),
                ),
            )
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn page(
        &self,
        user_id: UserId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<SummaryPage> {
        let paging_state = decode_token(resume)?;
        let mut stmt = self.page_stmt.clone();
        stmt.set_page_size(limit as i32);

        let (result, paging_state_response) = self
            .session
            .execute_single_page(&stmt, (user_id,), paging_state)
            .await
            .map_err(classify)?;

        let rows = result.into_rows_result().map_err(deser_error)?;
        let mut items = Vec::with_capacity(rows.rows_num());
        for row in rows.rows::<SummaryRow>().map_err(deser_error)? {
            items.push(ConversationSummary::from(row.map_err(deser_error)?));
        }
        Ok(SummaryPage {
            items,
            next: encode_state(paging_state_response),
        })
    }
}
