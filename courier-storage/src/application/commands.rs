//! 命令定义

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
}
