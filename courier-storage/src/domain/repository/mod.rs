//! 存储访问层仓储接口
//!
//! 每个反规范化表一个仓储，只暴露其分区键 / 聚簇键设计支持的操作，
//! 绝不发出需要二级索引或跨分区扫描的查询。
//!
//! 所有读写都可能以 [`StorageError`](courier_core::error::StorageError)
//! 的瞬时类别失败，由调用方决定是否退避重试。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::error::StorageResult;

use super::model::{
    ConversationId, ConversationMetadata, ConversationSummary, Message, MessageId, MessagePage,
    PageToken, SummaryPage, UserId,
};

/// messages_by_conversation 表访问接口
///
/// 分区键 conversation_id，聚簇键 (created_at DESC, message_id DESC)；
/// 所有读取都按聚簇顺序（最新在前）返回
#[async_trait]
pub trait MessageLogRepository: Send + Sync {
    /// 追加一条消息（源数据写入）
    async fn append(&self, message: &Message) -> StorageResult<()>;

    /// 读取一页消息；`resume` 为上一次调用返回的游标
    async fn page(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage>;

    /// 从 created_at 严格小于 `before` 的第一行开始读取一页消息
    async fn page_before(
        &self,
        conversation_id: ConversationId,
        before: DateTime<Utc>,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage>;
}

/// conversations_by_user 表访问接口
///
/// 覆盖写语义：同一键的写入以最新时间戳胜出（存储的冲突解决规则）
#[async_trait]
pub trait ConversationSummaryRepository: Send + Sync {
    /// 覆盖写一个参与者的会话摘要
    async fn upsert(&self, user_id: UserId, summary: &ConversationSummary) -> StorageResult<()>;

    /// 按最近活跃顺序读取一页会话摘要
    async fn page(
        &self,
        user_id: UserId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<SummaryPage>;
}

/// conversation_metadata 表访问接口
#[async_trait]
pub trait ConversationDirectoryRepository: Send + Sync {
    /// 幂等创建会话元数据；返回是否为本次创建
    async fn create_if_absent(&self, metadata: &ConversationMetadata) -> StorageResult<bool>;

    /// 按会话 id 读取元数据
    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> StorageResult<Option<ConversationMetadata>>;

    /// 条件推进最后一条消息摘要
    ///
    /// 仅当存量时间戳不比 `at` 更新时才写入，乱序到达的旧消息
    /// 不会回退已展示的摘要
    async fn advance_last_message(
        &self,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
        content: &str,
    ) -> StorageResult<()>;
}

/// user_conversations_lookup 表访问接口
///
/// 复合分区键 (user_id, other_user_id)；调用方为参与者对的
/// 两个方向各写一行，任一方向都能命中
#[async_trait]
pub trait PairLookupRepository: Send + Sync {
    async fn get(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> StorageResult<Option<ConversationId>>;

    async fn put(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        conversation_id: ConversationId,
    ) -> StorageResult<()>;
}

/// 消息 id 生成接口
///
/// 生成的 id 随时间戳单调增长，同一时间戳下仍互不相同，
/// 保证聚簇键 (created_at, message_id) 的唯一性
pub trait MessageIdGenerator: Send + Sync {
    fn next_id(&self, at: DateTime<Utc>) -> MessageId;
}
