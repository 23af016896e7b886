//! 领域模型
//!
//! 消息、会话元数据与按参与者反规范化的会话摘要，
//! 以及会话 id 的派生规则。

use chrono::{DateTime, Utc};
use courier_core::error::{CourierError, CourierResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户标识（正整数，存储中为 bigint）
pub type UserId = i64;

/// 会话标识（由无序参与者对派生）
pub type ConversationId = i64;

/// 消息标识（v1 风格 timeuuid，时间有序，同时间戳仍唯一）
pub type MessageId = Uuid;

/// 参与者 id 的上限
///
/// 派生算法将两个 32 位 id 合并为一个 64 位会话 id，
/// 超出 32 位的 id 会破坏无碰撞保证，在边界处直接拒绝
pub const MAX_USER_ID: i64 = u32::MAX as i64;

/// 校验用户 id（正整数且在派生算法的值域内）
pub fn validate_user_id(user_id: UserId) -> CourierResult<()> {
    if user_id <= 0 || user_id > MAX_USER_ID {
        return Err(CourierError::InvalidArgument(format!(
            "user id out of range: {user_id}"
        )));
    }
    Ok(())
}

/// 由无序参与者对派生会话 id
///
/// 对 (a, b) 与 (b, a) 返回相同的值：先排序再合并，
/// 较小的 id 占高 32 位。不同的无序对在值域内不会碰撞。
pub fn derive_conversation_id(user_a: UserId, user_b: UserId) -> CourierResult<ConversationId> {
    validate_user_id(user_a)?;
    validate_user_id(user_b)?;
    let (low, high) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    Ok((low << 32) | high)
}

/// 单条消息（写入后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// 会话元数据（conversation_metadata 表）
///
/// 身份部分（参与者、创建时间）不可变；最后一条消息摘要
/// 随每次发送条件推进，时间戳不回退
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub conversation_id: ConversationId,
    pub user_a: UserId,
    pub user_b: UserId,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_content: Option<String>,
}

impl ConversationMetadata {
    /// 以规范化的参与者顺序（小 id 在前）创建元数据
    pub fn new(
        conversation_id: ConversationId,
        user_a: UserId,
        user_b: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (user_a, user_b) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        Self {
            conversation_id,
            user_a,
            user_b,
            created_at,
            last_message_at: None,
            last_message_content: None,
        }
    }

    pub fn participants(&self) -> [UserId; 2] {
        [self.user_a, self.user_b]
    }
}

/// 会话摘要（conversations_by_user 表中的反规范化行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub other_user_id: UserId,
    pub last_message_at: DateTime<Utc>,
    pub last_message_content: String,
}

/// 不透明分页游标
///
/// 包装存储原生的续页状态，调用方在两次调用之间原样传递。
/// 底层存储不支持数值偏移，游标只能顺序获得：没有上一页的
/// 游标就无法直接定位第 N 页（已知限制，见分页规划模块）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 消息分页结果
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub items: Vec<Message>,
    /// 续页游标；为 None 表示聚簇顺序已经扫到尽头
    pub next: Option<PageToken>,
}

/// 会话摘要分页结果
#[derive(Debug, Clone)]
pub struct SummaryPage {
    pub items: Vec<ConversationSummary>,
    pub next: Option<PageToken>,
}

/// 发送结果状态
///
/// 多表写扇出没有原子性，部分失败作为显式结果建模而非伪装成事务
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// 源数据与全部摘要均已写入
    Committed,
    /// 源数据已持久化，但列出的参与者的会话列表条目仍是旧值，
    /// 等待后台修复或下一条消息触发新的覆盖写
    Degraded { stale: Vec<UserId> },
}

/// 发送回执
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message: Message,
    pub status: SendStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_commutative() {
        assert_eq!(
            derive_conversation_id(7, 42).unwrap(),
            derive_conversation_id(42, 7).unwrap()
        );
    }

    #[test]
    fn distinct_pairs_do_not_collide() {
        let ab = derive_conversation_id(1, 2).unwrap();
        let ac = derive_conversation_id(1, 3).unwrap();
        let bc = derive_conversation_id(2, 3).unwrap();
        assert_ne!(ab, ac);
        assert_ne!(ab, bc);
        assert_ne!(ac, bc);
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert!(derive_conversation_id(0, 2).is_err());
        assert!(derive_conversation_id(-5, 2).is_err());
        assert!(derive_conversation_id(1, MAX_USER_ID + 1).is_err());
        assert!(derive_conversation_id(1, MAX_USER_ID).is_ok());
    }

    #[test]
    fn metadata_normalizes_participant_order() {
        let meta = ConversationMetadata::new(99, 42, 7, chrono::Utc::now());
        assert_eq!(meta.participants(), [7, 42]);
    }
}
