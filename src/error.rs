//! Courier 错误类型定义
//!
//! 存储访问层的错误分类：瞬时错误（可退避重试）与调用方错误
//! （不允许原样重试）在类型上显式区分。

use thiserror::Error;

/// 存储访问层错误类型
#[derive(Debug, Error)]
pub enum StorageError {
    /// 存储不可用（节点不可达，或副本数不足以满足请求的一致性级别）
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// 存储请求超时
    #[error("storage request timed out: {0}")]
    Timeout(String),

    /// 非法分页游标
    #[error("invalid paging cursor")]
    InvalidCursor,

    /// 其他数据库错误
    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    /// 瞬时错误可由调用方带退避重试；游标错误不允许原样重试
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable(_) | StorageError::Timeout(_)
        )
    }
}

/// 存储访问层结果类型
pub type StorageResult<T> = Result<T, StorageError>;

/// 对外暴露的业务错误类型
#[derive(Debug, Error)]
pub enum CourierError {
    /// 源数据写入失败，整个发送操作中止
    ///
    /// 重试整个发送是安全的：每次尝试都会生成新的消息 id
    #[error("message append failed: {source}")]
    SendFailed {
        #[source]
        source: StorageError,
    },

    /// 会话不存在（属于「不存在」而非存储故障）
    #[error("conversation not found: {0}")]
    ConversationNotFound(i64),

    /// 无效的参数（边界校验一次完成，访问器内部不再重复校验）
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 存储错误透传
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 业务结果类型
pub type CourierResult<T> = Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retriable() {
        assert!(StorageError::Unavailable("node down".into()).is_retriable());
        assert!(StorageError::Timeout("write timeout".into()).is_retriable());
    }

    #[test]
    fn cursor_and_database_errors_are_not_retriable() {
        assert!(!StorageError::InvalidCursor.is_retriable());
        assert!(!StorageError::Database("syntax".into()).is_retriable());
    }
}
