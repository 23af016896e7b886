//! 查询处理器（查询侧）- 直接调用表访问器，不经过领域服务
//!
//! 查询是只读操作，不涉及写扇出，各表按自己的键序读取即可；
//! 分页规划（页号 → 游标语义）是查询侧唯一的共同逻辑。

use std::sync::Arc;

use courier_core::error::{CourierError, CourierResult, StorageError};
use courier_core::metrics::StorageMetrics;
use tracing::instrument;

use crate::application::queries::{
    GetConversationQuery, ListConversationMessagesBeforeQuery, ListConversationMessagesQuery,
    ListUserConversationsQuery,
};
use crate::domain::model::{
    ConversationMetadata, ConversationSummary, Message, PageToken, validate_user_id,
};
use crate::domain::repository::{
    ConversationDirectoryRepository, ConversationSummaryRepository, MessageLogRepository,
};
use crate::domain::service::{PagePlan, plan_page};

/// 会话列表分页视图
#[derive(Debug, Clone)]
pub struct ConversationListView {
    pub items: Vec<ConversationSummary>,
    pub has_more: bool,
    pub next_cursor: Option<PageToken>,
}

/// 消息列表分页视图
#[derive(Debug, Clone)]
pub struct MessageListView {
    pub items: Vec<Message>,
    pub has_more: bool,
    pub next_cursor: Option<PageToken>,
}

/// 会话读取模型
pub struct ConversationQueryHandler {
    message_log: Arc<dyn MessageLogRepository>,
    summaries: Arc<dyn ConversationSummaryRepository>,
    directory: Arc<dyn ConversationDirectoryRepository>,
    metrics: Arc<StorageMetrics>,
    default_page_size: u32,
    max_page_size: u32,
}

impl ConversationQueryHandler {
    pub fn new(
        message_log: Arc<dyn MessageLogRepository>,
        summaries: Arc<dyn ConversationSummaryRepository>,
        directory: Arc<dyn ConversationDirectoryRepository>,
        metrics: Arc<StorageMetrics>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        Self {
            message_log,
            summaries,
            directory,
            metrics,
            default_page_size,
            max_page_size,
        }
    }

    /// 用户会话列表（最近活跃在前）
    #[instrument(skip(self, query), fields(user_id = query.user_id))]
    pub async fn handle_list_user_conversations(
        &self,
        query: ListUserConversationsQuery,
    ) -> CourierResult<ConversationListView> {
        validate_user_id(query.user_id)?;
        let plan = self.plan(query.page, query.limit, query.cursor);

        let page = self
            .summaries
            .page(query.user_id, plan.limit, plan.resume())
            .await
            .map_err(|err| self.on_read_error(err))?;
        self.metrics
            .page_reads_total
            .with_label_values(&["conversations_by_user"])
            .inc();

        Ok(ConversationListView {
            has_more: page.next.is_some(),
            items: page.items,
            next_cursor: page.next,
        })
    }

    /// 会话元数据
    #[instrument(skip(self, query), fields(conversation_id = query.conversation_id))]
    pub async fn handle_get_conversation(
        &self,
        query: GetConversationQuery,
    ) -> CourierResult<ConversationMetadata> {
        self.directory
            .get(query.conversation_id)
            .await?
            .ok_or(CourierError::ConversationNotFound(query.conversation_id))
    }

    /// 会话消息列表（最新在前）
    #[instrument(skip(self, query), fields(conversation_id = query.conversation_id))]
    pub async fn handle_list_conversation_messages(
        &self,
        query: ListConversationMessagesQuery,
    ) -> CourierResult<MessageListView> {
        let plan = self.plan(query.page, query.limit, query.cursor);

        let page = self
            .message_log
            .page(query.conversation_id, plan.limit, plan.resume())
            .await
            .map_err(|err| self.on_read_error(err))?;
        self.metrics
            .page_reads_total
            .with_label_values(&["messages_by_conversation"])
            .inc();

        Ok(MessageListView {
            has_more: page.next.is_some(),
            items: page.items,
            next_cursor: page.next,
        })
    }

    /// 会话消息列表，从给定时间戳之前开始
    #[instrument(skip(self, query), fields(conversation_id = query.conversation_id))]
    pub async fn handle_list_conversation_messages_before(
        &self,
        query: ListConversationMessagesBeforeQuery,
    ) -> CourierResult<MessageListView> {
        let plan = self.plan(query.page, query.limit, query.cursor);

        let page = self
            .message_log
            .page_before(
                query.conversation_id,
                query.before,
                plan.limit,
                plan.resume(),
            )
            .await
            .map_err(|err| self.on_read_error(err))?;
        self.metrics
            .page_reads_total
            .with_label_values(&["messages_by_conversation"])
            .inc();

        Ok(MessageListView {
            has_more: page.next.is_some(),
            items: page.items,
            next_cursor: page.next,
        })
    }

    fn plan(&self, page: u32, limit: u32, cursor: Option<PageToken>) -> PagePlan {
        let limit = if limit == 0 {
            self.default_page_size
        } else {
            limit
        };
        plan_page(page, limit, cursor, self.max_page_size)
    }

    fn on_read_error(&self, err: StorageError) -> CourierError {
        if matches!(err, StorageError::InvalidCursor) {
            self.metrics.cursor_decode_failure_total.inc();
        }
        CourierError::Storage(err)
    }
}
