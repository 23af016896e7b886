//! 测试支撑：以内存结构复现各表的键序与分页语义
//!
//! 游标在这里编码为行偏移文本；对被测代码而言它与存储原生的
//! 续页状态一样是不透明令牌，只能原样传回。

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::error::{StorageError, StorageResult};

use crate::domain::model::{
    ConversationId, ConversationMetadata, ConversationSummary, Message, MessagePage, PageToken,
    SummaryPage, UserId,
};
use crate::domain::repository::{
    ConversationDirectoryRepository, ConversationSummaryRepository, MessageLogRepository,
    PairLookupRepository,
};

fn decode_offset(resume: Option<&PageToken>) -> StorageResult<usize> {
    match resume {
        None => Ok(0),
        Some(token) => token
            .as_str()
            .parse()
            .map_err(|_| StorageError::InvalidCursor),
    }
}

fn encode_offset(offset: usize) -> PageToken {
    PageToken::new(offset.to_string())
}

/// timeuuid 的排序键：60 位时间戳在前，原始字节兜底
fn message_sort_key(message: &Message) -> (i64, u64, [u8; 16]) {
    let ticks = message
        .message_id
        .get_timestamp()
        .map(|ts| {
            let (secs, nanos) = ts.to_unix();
            secs * 10_000_000 + u64::from(nanos) / 100
        })
        .unwrap_or(0);
    (
        message.created_at.timestamp_millis(),
        ticks,
        *message.message_id.as_bytes(),
    )
}

/// messages_by_conversation 的内存替身
///
/// 读取按 (created_at DESC, message_id DESC) 聚簇顺序返回
pub(crate) struct MemoryMessageLog {
    rows: Mutex<Vec<Message>>,
    pub fail_append: AtomicBool,
}

impl MemoryMessageLog {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_append: AtomicBool::new(false),
        }
    }

    pub fn all(&self) -> Vec<Message> {
        self.rows.lock().unwrap().clone()
    }

    fn page_filtered(
        &self,
        conversation_id: ConversationId,
        before: Option<DateTime<Utc>>,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        let offset = decode_offset(resume)?;
        let mut rows: Vec<Message> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .filter(|m| before.is_none_or(|b| m.created_at < b))
            .cloned()
            .collect();
        rows.sort_by(|a, b| message_sort_key(b).cmp(&message_sort_key(a)));

        let items: Vec<Message> = rows.iter().skip(offset).take(limit).cloned().collect();
        let consumed = offset + items.len();
        let next = (consumed < rows.len()).then(|| encode_offset(consumed));
        Ok(MessagePage { items, next })
    }
}

#[async_trait]
impl MessageLogRepository for MemoryMessageLog {
    async fn append(&self, message: &Message) -> StorageResult<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected append failure".into()));
        }
        self.rows.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn page(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        self.page_filtered(conversation_id, None, limit, resume)
    }

    async fn page_before(
        &self,
        conversation_id: ConversationId,
        before: DateTime<Utc>,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<MessagePage> {
        self.page_filtered(conversation_id, Some(before), limit, resume)
    }
}

/// conversations_by_user 的内存替身
///
/// 每个 (user_id, conversation_id) 只保留最后一次覆盖写
pub(crate) struct MemoryConversationSummaries {
    rows: Mutex<HashMap<UserId, HashMap<ConversationId, ConversationSummary>>>,
    fail_for: Mutex<HashSet<UserId>>,
}

impl MemoryConversationSummaries {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            fail_for: Mutex::new(HashSet::new()),
        }
    }

    /// 注入指定参与者的覆盖写失败
    pub fn fail_for(&self, user_id: UserId) {
        self.fail_for.lock().unwrap().insert(user_id);
    }

    pub fn entry(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Option<ConversationSummary> {
        self.rows
            .lock()
            .unwrap()
            .get(&user_id)
            .and_then(|m| m.get(&conversation_id))
            .cloned()
    }
}

#[async_trait]
impl ConversationSummaryRepository for MemoryConversationSummaries {
    async fn upsert(&self, user_id: UserId, summary: &ConversationSummary) -> StorageResult<()> {
        if self.fail_for.lock().unwrap().contains(&user_id) {
            return Err(StorageError::Unavailable("injected upsert failure".into()));
        }
        self.rows
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .insert(summary.conversation_id, summary.clone());
        Ok(())
    }

    async fn page(
        &self,
        user_id: UserId,
        limit: usize,
        resume: Option<&PageToken>,
    ) -> StorageResult<SummaryPage> {
        let offset = decode_offset(resume)?;
        let mut rows: Vec<ConversationSummary> = self
            .rows
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| {
            (b.last_message_at, b.conversation_id).cmp(&(a.last_message_at, a.conversation_id))
        });

        let items: Vec<ConversationSummary> =
            rows.iter().skip(offset).take(limit).cloned().collect();
        let consumed = offset + items.len();
        let next = (consumed < rows.len()).then(|| encode_offset(consumed));
        Ok(SummaryPage { items, next })
    }
}

/// conversation_metadata 的内存替身
pub(crate) struct MemoryConversationDirectory {
    rows: Mutex<HashMap<ConversationId, ConversationMetadata>>,
    pub create_attempts: AtomicUsize,
}

impl MemoryConversationDirectory {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            create_attempts: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversationDirectoryRepository for MemoryConversationDirectory {
    async fn create_if_absent(&self, metadata: &ConversationMetadata) -> StorageResult<bool> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&metadata.conversation_id) {
            return Ok(false);
        }
        rows.insert(metadata.conversation_id, metadata.clone());
        Ok(true)
    }

    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> StorageResult<Option<ConversationMetadata>> {
        Ok(self.rows.lock().unwrap().get(&conversation_id).cloned())
    }

    async fn advance_last_message(
        &self,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
        content: &str,
    ) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(metadata) = rows.get_mut(&conversation_id) {
            // 条件推进：存量时间戳更新时放弃，不回退
            if metadata.last_message_at.is_none_or(|cur| cur <= at) {
                metadata.last_message_at = Some(at);
                metadata.last_message_content = Some(content.to_string());
            }
        }
        Ok(())
    }
}

/// user_conversations_lookup 的内存替身
pub(crate) struct MemoryPairLookup {
    rows: Mutex<HashMap<(UserId, UserId), ConversationId>>,
}

impl MemoryPairLookup {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl PairLookupRepository for MemoryPairLookup {
    async fn get(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> StorageResult<Option<ConversationId>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(user_id, other_user_id))
            .copied())
    }

    async fn put(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        conversation_id: ConversationId,
    ) -> StorageResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert((user_id, other_user_id), conversation_id);
        Ok(())
    }
}
