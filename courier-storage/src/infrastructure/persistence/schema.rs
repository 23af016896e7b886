//! 键空间与表结构初始化
//!
//! 四张反规范化表各自面向一种查询；表结构由外部初始化步骤
//! 创建，这里提供的是等价的按需初始化（IF NOT EXISTS，可重复
//! 执行），供部署脚本或启动开关调用。

use anyhow::{Context, Result};
use scylla::client::session::Session;
use tracing::info;

/// 会话内消息，按 (created_at DESC, message_id DESC) 聚簇
const CREATE_MESSAGES_BY_CONVERSATION: &str = r#"
    CREATE TABLE IF NOT EXISTS messages_by_conversation (
        conversation_id bigint,
        created_at timestamp,
        message_id timeuuid,
        sender_id bigint,
        receiver_id bigint,
        content text,
        PRIMARY KEY (conversation_id, created_at, message_id)
    ) WITH CLUSTERING ORDER BY (created_at DESC, message_id DESC)
"#;

/// 用户的会话列表，按最近活跃聚簇
const CREATE_CONVERSATIONS_BY_USER: &str = r#"
    CREATE TABLE IF NOT EXISTS conversations_by_user (
        user_id bigint,
        last_message_at timestamp,
        conversation_id bigint,
        other_user_id bigint,
        last_message_content text,
        PRIMARY KEY (user_id, last_message_at, conversation_id)
    ) WITH CLUSTERING ORDER BY (last_message_at DESC, conversation_id DESC)
"#;

/// 会话元数据（单行分区）
const CREATE_CONVERSATION_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS conversation_metadata (
        conversation_id bigint,
        user_a_id bigint,
        user_b_id bigint,
        created_at timestamp,
        last_message_at timestamp,
        last_message_content text,
        PRIMARY KEY (conversation_id)
    )
"#;

/// 参与者对 → 会话 id 的幂等查找，复合分区键
const CREATE_USER_CONVERSATIONS_LOOKUP: &str = r#"
    CREATE TABLE IF NOT EXISTS user_conversations_lookup (
        user_id bigint,
        other_user_id bigint,
        conversation_id bigint,
        PRIMARY KEY ((user_id, other_user_id))
    )
"#;

/// 按需创建键空间（可重复执行）
pub async fn ensure_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u32,
) -> Result<()> {
    let ddl = format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
    );
    session
        .query_unpaged(ddl, ())
        .await
        .with_context(|| format!("failed to create keyspace {keyspace}"))?;
    info!(keyspace, "keyspace ready");
    Ok(())
}

/// 按需创建全部表（可重复执行）
pub async fn ensure_tables(session: &Session) -> Result<()> {
    for ddl in [
        CREATE_MESSAGES_BY_CONVERSATION,
        CREATE_CONVERSATIONS_BY_USER,
        CREATE_CONVERSATION_METADATA,
        CREATE_USER_CONVERSATIONS_LOOKUP,
    ] {
        session
            .query_unpaged(ddl, ())
            .await
            .context("failed to create table")?;
    }
    info!("tables ready");
    Ok(())
}
