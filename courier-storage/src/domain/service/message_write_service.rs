//! 消息写入领域服务
//!
//! 「发送消息」的多表写扇出协调。底层存储没有跨表事务，
//! 各步骤按固定顺序执行，每一步有明确的失败策略：
//!
//! 1. 幂等保障会话存在：lookup 未命中时创建元数据（IF NOT EXISTS）
//!    并双向回写 lookup，上一次尝试部分完成后重复执行是安全的
//! 2. 一次性采集 created_at 并由它生成消息 id，所有反规范化副本
//!    使用同一时刻
//! 3. 写入 messages_by_conversation —— 源数据写入，失败则整体中止，
//!    不会产生任何超前于源数据的摘要
//! 4. 为发送方与接收方独立地覆盖写会话摘要，并条件推进元数据摘要；
//!    单侧失败不阻塞另一侧，整体降级为 Degraded 成功

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use courier_core::error::{CourierError, CourierResult, StorageResult};
use courier_core::metrics::StorageMetrics;
use courier_core::utils::truncate_to_millis;
use tracing::{debug, instrument, warn};

use crate::domain::model::{
    ConversationId, ConversationMetadata, ConversationSummary, Message, SendReceipt, SendStatus,
    UserId, derive_conversation_id,
};
use crate::domain::repository::{
    ConversationDirectoryRepository, ConversationSummaryRepository, MessageIdGenerator,
    MessageLogRepository, PairLookupRepository,
};

/// 消息写入领域服务
pub struct MessageWriteService {
    message_log: Arc<dyn MessageLogRepository>,
    summaries: Arc<dyn ConversationSummaryRepository>,
    directory: Arc<dyn ConversationDirectoryRepository>,
    pair_lookup: Arc<dyn PairLookupRepository>,
    id_generator: Arc<dyn MessageIdGenerator>,
    metrics: Arc<StorageMetrics>,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl MessageWriteService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        message_log: Arc<dyn MessageLogRepository>,
        summaries: Arc<dyn ConversationSummaryRepository>,
        directory: Arc<dyn ConversationDirectoryRepository>,
        pair_lookup: Arc<dyn PairLookupRepository>,
        id_generator: Arc<dyn MessageIdGenerator>,
        metrics: Arc<StorageMetrics>,
        retry_attempts: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            message_log,
            summaries,
            directory,
            pair_lookup,
            id_generator,
            metrics,
            retry_attempts,
            retry_backoff,
        }
    }

    /// 执行一次完整的发送写扇出
    #[instrument(skip(self, content))]
    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
    ) -> CourierResult<SendReceipt> {
        let conversation_id = derive_conversation_id(sender_id, receiver_id)?;

        self.ensure_conversation(conversation_id, sender_id, receiver_id)
            .await?;

        // 时间与 id 只采集一次
        let created_at = truncate_to_millis(Utc::now());
        let message_id = self.id_generator.next_id(created_at);
        let message = Message {
            conversation_id,
            message_id,
            sender_id,
            receiver_id,
            content,
            created_at,
        };

        let timer = self.metrics.send_duration_seconds.start_timer();

        // 源数据写入：只有它成功之后消息才算存在
        if let Err(err) = self.message_log.append(&message).await {
            timer.observe_duration();
            self.metrics.sends_failed_total.inc();
            return Err(CourierError::SendFailed { source: err });
        }

        let status = self.fan_out_summaries(&message).await;
        timer.observe_duration();
        self.metrics.messages_stored_total.inc();

        if let SendStatus::Degraded { stale } = &status {
            self.metrics.sends_degraded_total.inc();
            warn!(
                conversation_id,
                message_id = %message.message_id,
                stale = ?stale,
                "summary fan-out incomplete, conversation list entries stale until repaired"
            );
        }

        Ok(SendReceipt { message, status })
    }

    /// 幂等保障会话存在
    ///
    /// lookup → 元数据 IF NOT EXISTS → 双向 lookup 回写。并发创建时
    /// 只有一个写入者胜出，其余照常继续；任一步骤失败后整体重来
    /// 不会产生重复会话。
    async fn ensure_conversation(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> CourierResult<()> {
        let existing = self
            .with_retry(|| self.pair_lookup.get(sender_id, receiver_id))
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let metadata = ConversationMetadata::new(
            conversation_id,
            sender_id,
            receiver_id,
            truncate_to_millis(Utc::now()),
        );
        let created = self
            .with_retry(|| self.directory.create_if_absent(&metadata))
            .await?;
        if created {
            debug!(conversation_id, sender_id, receiver_id, "conversation created");
        }

        // 双向写入 lookup，任一参与者发起的下一次查找都能命中
        self.with_retry(|| self.pair_lookup.put(sender_id, receiver_id, conversation_id))
            .await?;
        self.with_retry(|| self.pair_lookup.put(receiver_id, sender_id, conversation_id))
            .await?;
        Ok(())
    }

    /// 为两个参与者独立地覆盖写会话摘要，并条件推进元数据摘要
    ///
    /// 返回的状态只反映会话列表条目的新旧；元数据摘要推进失败
    /// 由下一条消息自然补偿，不计入降级
    async fn fan_out_summaries(&self, message: &Message) -> SendStatus {
        let sender_entry = ConversationSummary {
            conversation_id: message.conversation_id,
            other_user_id: message.receiver_id,
            last_message_at: message.created_at,
            last_message_content: message.content.clone(),
        };
        let receiver_entry = ConversationSummary {
            conversation_id: message.conversation_id,
            other_user_id: message.sender_id,
            last_message_at: message.created_at,
            last_message_content: message.content.clone(),
        };

        let (sender_res, receiver_res, advance_res) = tokio::join!(
            self.with_retry(|| self.summaries.upsert(message.sender_id, &sender_entry)),
            self.with_retry(|| self.summaries.upsert(message.receiver_id, &receiver_entry)),
            self.with_retry(|| {
                self.directory.advance_last_message(
                    message.conversation_id,
                    message.created_at,
                    &message.content,
                )
            }),
        );

        let mut stale = Vec::new();
        if let Err(err) = sender_res {
            warn!(user_id = message.sender_id, error = %err, "sender summary upsert failed");
            stale.push(message.sender_id);
        }
        if let Err(err) = receiver_res {
            warn!(user_id = message.receiver_id, error = %err, "receiver summary upsert failed");
            stale.push(message.receiver_id);
        }
        if let Err(err) = advance_res {
            warn!(
                conversation_id = message.conversation_id,
                error = %err,
                "metadata last-message advance failed"
            );
        }

        if stale.is_empty() {
            SendStatus::Committed
        } else {
            SendStatus::Degraded { stale }
        }
    }

    /// 对幂等步骤的瞬时失败做有限次退避重试
    ///
    /// 只用于 lookup 回写、元数据创建与摘要覆盖写；唯一性消息追加
    /// 绝不经过这里盲目重试
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retriable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(error = %err, attempt, "transient storage error, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
