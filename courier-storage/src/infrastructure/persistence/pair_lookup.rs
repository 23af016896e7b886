//! user_conversations_lookup 表访问器
//!
//! 复合分区键 (user_id, other_user_id)，无聚簇键。调用方为参与者
//! 对的两个方向各写一行，任一方向的点查都能命中。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use courier_core::error::StorageResult;
use scylla::client::session::Session;
use scylla::statement::prepared::PreparedStatement;

use crate::config::StorageConfig;
use crate::domain::model::{ConversationId, UserId};
use crate::domain::repository::PairLookupRepository;

use super::helpers::{classify, deser_error};

const GET: &str = r#"
    SELECT conversation_id FROM user_conversations_lookup
    WHERE user_id = ? AND other_user_id = ?
"#;

const PUT: &str = r#"
    INSERT INTO user_conversations_lookup (user_id, other_user_id, conversation_id)
    VALUES (?, ?, ?)
"#;

/// user_conversations_lookup 的宽列存储实现
pub struct ScyllaPairLookup {
    session: Arc<Session>,
    get_stmt: PreparedStatement,
    put_stmt: PreparedStatement,
}

impl ScyllaPairLookup {
    pub async fn new(session: Arc<Session>, config: &StorageConfig) -> Result<Self> {
        let mut get_stmt = session
            .prepare(GET)
            .await
            .context("failed to prepare lookup get statement")?;
        get_stmt.set_consistency(config.read_consistency_level());

        let mut put_stmt = session
            .prepare(PUT)
            .await
            .context("failed to prepare lookup put statement")?;
        put_stmt.set_consistency(config.write_consistency_level());

        Ok(Self {
            session,
            get_stmt,
            put_stmt,
        })
    }
}

#[async_trait]
impl PairLookupRepository for ScyllaPairLookup {
    async fn get(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> StorageResult<Option<ConversationId>> {
        let result = self
            .session
            .execute_unpaged(&self.get_stmt, (user_id, other_user_id))
            .await
            .map_err(classify)?;
        let rows = result.into_rows_result().map_err(deser_error)?;
        let row = rows.maybe_first_row::<(i64,)>().map_err(deser_error)?;
        Ok(row.map(|(conversation_id,)| conversation_id))
    }

    async fn put(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        conversation_id: ConversationId,
    ) -> StorageResult<()> {
        self.session
            .execute_unpaged(&self.put_stmt, (user_id, other_user_id, conversation_id))
            .await
            .map_err(classify)?;
        Ok(())
    }
}
