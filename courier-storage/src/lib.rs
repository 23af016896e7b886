//! Courier 存储访问层
//!
//! 基于分区宽列存储的一对一消息与会话摘要存取核心：
//! - 「发送消息」的多表反规范化写扇出（有序步骤 + 显式的部分失败结果）
//! - 基于存储原生续页状态的稳定游标分页
//! - 会话读取模型（用户会话列表 / 会话消息列表）
//!
//! 底层存储不提供跨表事务；各表按各自的分区键 / 聚簇键独立建模，
//! 反规范化副本之间是最终一致而非事务一致。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod service;

#[cfg(test)]
pub(crate) mod testkit;

pub use application::handlers::{ConversationQueryHandler, MessageCommandHandler};
pub use config::StorageConfig;
pub use service::wire::{ApplicationContext, initialize};
