//! 行映射与驱动错误归类

use chrono::{DateTime, Utc};
use courier_core::error::{StorageError, StorageResult};
use scylla::errors::{DbError, ExecutionError, RequestAttemptError};
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlTimeuuid, Row};
use uuid::Uuid;

use crate::domain::model::{ConversationMetadata, ConversationSummary, Message};

/// messages_by_conversation 的行
#[derive(scylla::DeserializeRow)]
pub(crate) struct MessageRow {
    pub conversation_id: i64,
    pub created_at: DateTime<Utc>,
    pub message_id: CqlTimeuuid,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            conversation_id: row.conversation_id,
            message_id: Uuid::from(row.message_id),
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// conversations_by_user 的行（分区键列不需要取回）
#[derive(scylla::DeserializeRow)]
pub(crate) struct SummaryRow {
    pub conversation_id: i64,
    pub other_user_id: i64,
    pub last_message_at: DateTime<Utc>,
    pub last_message_content: String,
}

impl From<SummaryRow> for ConversationSummary {
    fn from(row: SummaryRow) -> Self {
        ConversationSummary {
            conversation_id: row.conversation_id,
            other_user_id: row.other_user_id,
            last_message_at: row.last_message_at,
            last_message_content: row.last_message_content,
        }
    }
}

/// conversation_metadata 的行
#[derive(scylla::DeserializeRow)]
pub(crate) struct MetadataRow {
    pub conversation_id: i64,
    pub user_a_id: i64,
    pub user_b_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_content: Option<String>,
}

impl From<MetadataRow> for ConversationMetadata {
    fn from(row: MetadataRow) -> Self {
        ConversationMetadata {
            conversation_id: row.conversation_id,
            user_a: row.user_a_id,
            user_b: row.user_b_id,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
            last_message_content: row.last_message_content,
        }
    }
}

/// 将驱动错误归类到存储错误分类
///
/// 瞬时类别（不可用 / 超时）与其他数据库错误在这里一次性区分，
/// 上层据此决定是否退避重试
pub(crate) fn classify(err: ExecutionError) -> StorageError {
    match &err {
        ExecutionError::RequestTimeout(_) => StorageError::Timeout(err.to_string()),
        ExecutionError::ConnectionPoolError(_) => StorageError::Unavailable(err.to_string()),
        ExecutionError::LastAttemptError(attempt) => classify_attempt(attempt, &err),
        _ => StorageError::Database(err.to_string()),
    }
}

fn classify_attempt(attempt: &RequestAttemptError, err: &ExecutionError) -> StorageError {
    match attempt {
        RequestAttemptError::DbError(db_error, _) => match db_error {
            DbError::Unavailable { .. } | DbError::Overloaded | DbError::IsBootstrapping => {
                StorageError::Unavailable(err.to_string())
            }
            DbError::ReadTimeout { .. } | DbError::WriteTimeout { .. } => {
                StorageError::Timeout(err.to_string())
            }
            _ => StorageError::Database(err.to_string()),
        },
        _ => StorageError::Database(err.to_string()),
    }
}

/// 行集解码失败统一归为数据库错误
pub(crate) fn deser_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Database(err.to_string())
}

/// 读取 LWT 结果的 `[applied]` 列
pub(crate) fn lwt_applied(result: QueryResult) -> StorageResult<bool> {
    let rows = result.into_rows_result().map_err(deser_error)?;
    let row = rows.first_row::<Row>().map_err(deser_error)?;
    Ok(row
        .columns
        .first()
        .and_then(|column| column.as_ref())
        .and_then(|value| value.as_boolean())
        .unwrap_or(false))
}
