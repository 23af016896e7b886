//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建存储访问层的全部组件，返回对外的
//! 命令 / 查询处理器。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use courier_core::config::AppConfig;
use courier_core::metrics::StorageMetrics;
use tracing::info;

use crate::application::handlers::{ConversationQueryHandler, MessageCommandHandler};
use crate::config::StorageConfig;
use crate::domain::repository::{
    ConversationDirectoryRepository, ConversationSummaryRepository, MessageIdGenerator,
    MessageLogRepository, PairLookupRepository,
};
use crate::domain::service::MessageWriteService;
use crate::infrastructure::id_generator::TimeuuidGenerator;
use crate::infrastructure::persistence::{
    ScyllaConversationDirectory, ScyllaConversationSummaries, ScyllaMessageLog, ScyllaPairLookup,
    schema, session,
};

/// 应用上下文 - 包含对外暴露的处理器
pub struct ApplicationContext {
    pub command_handler: Arc<MessageCommandHandler>,
    pub query_handler: Arc<ConversationQueryHandler>,
}

/// 构建应用上下文
///
/// 按照依赖顺序构建所有组件
pub async fn initialize(app_config: &AppConfig) -> Result<ApplicationContext> {
    // 1. 加载存储层配置（环境变量优先）
    let config =
        StorageConfig::from_app_config(app_config).context("failed to load storage configuration")?;

    // 2. 初始化指标收集
    let metrics = Arc::new(StorageMetrics::new());

    // 3. 连接集群（带重试），按需初始化键空间与表结构
    let session = Arc::new(session::connect(&config).await?);
    if config.auto_init_schema {
        schema::ensure_keyspace(&session, &config.keyspace, config.replication_factor).await?;
    }
    session
        .use_keyspace(&config.keyspace, false)
        .await
        .with_context(|| format!("failed to switch to keyspace {}", config.keyspace))?;
    if config.auto_init_schema {
        schema::ensure_tables(&session).await?;
    }

    // 4. 构建各表访问器
    let message_log = Arc::new(ScyllaMessageLog::new(session.clone(), &config).await?)
        as Arc<dyn MessageLogRepository>;
    let summaries = Arc::new(ScyllaConversationSummaries::new(session.clone(), &config).await?)
        as Arc<dyn ConversationSummaryRepository>;
    let directory = Arc::new(ScyllaConversationDirectory::new(session.clone(), &config).await?)
        as Arc<dyn ConversationDirectoryRepository>;
    let pair_lookup = Arc::new(ScyllaPairLookup::new(session.clone(), &config).await?)
        as Arc<dyn PairLookupRepository>;

    // 5. 消息 id 生成器
    let id_generator = Arc::new(TimeuuidGenerator::new()) as Arc<dyn MessageIdGenerator>;

    // 6. 写入领域服务与命令处理器
    let write_service = Arc::new(MessageWriteService::new(
        message_log.clone(),
        summaries.clone(),
        directory.clone(),
        pair_lookup,
        id_generator,
        metrics.clone(),
        config.summary_retry_attempts,
        Duration::from_millis(config.retry_backoff_ms),
    ));
    let command_handler = Arc::new(MessageCommandHandler::new(write_service));

    // 7. 查询处理器（查询侧直接使用访问器）
    let query_handler = Arc::new(ConversationQueryHandler::new(
        message_log,
        summaries,
        directory,
        metrics,
        config.default_page_size,
        config.max_page_size,
    ));

    info!(keyspace = %config.keyspace, "storage access layer initialized");
    Ok(ApplicationContext {
        command_handler,
        query_handler,
    })
}
