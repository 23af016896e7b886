//! 查询定义

use chrono::{DateTime, Utc};

use crate::domain::model::{ConversationId, PageToken, UserId};

/// 用户会话列表查询
#[derive(Debug, Clone)]
pub struct ListUserConversationsQuery {
    pub user_id: UserId,
    pub page: u32,
    pub limit: u32,
    pub cursor: Option<PageToken>,
}

/// 会话元数据查询
#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub conversation_id: ConversationId,
}

/// 会话消息列表查询
#[derive(Debug, Clone)]
pub struct ListConversationMessagesQuery {
    pub conversation_id: ConversationId,
    pub page: u32,
    pub limit: u32,
    pub cursor: Option<PageToken>,
}

/// 按时间戳向前翻页的消息列表查询
///
/// 扫描直接从 created_at 严格小于 `before` 的第一行播种，
/// 不需要先顺序走到该位置
#[derive(Debug, Clone)]
pub struct ListConversationMessagesBeforeQuery {
    pub conversation_id: ConversationId,
    pub before: DateTime<Utc>,
    pub page: u32,
    pub limit: u32,
    pub cursor: Option<PageToken>,
}
