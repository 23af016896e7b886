//! 命令处理器（命令侧）
//!
//! 请求边界的参数校验只在这里做一次；访问器与领域服务
//! 内部不再重复校验。

use std::sync::Arc;

use courier_core::error::{CourierError, CourierResult};
use tracing::{info, instrument};

use crate::application::commands::SendMessageCommand;
use crate::domain::model::{SendReceipt, validate_user_id};
use crate::domain::service::MessageWriteService;

/// 消息命令处理器
pub struct MessageCommandHandler {
    write_service: Arc<MessageWriteService>,
}

impl MessageCommandHandler {
    pub fn new(write_service: Arc<MessageWriteService>) -> Self {
        Self { write_service }
    }

    /// 处理发送消息命令
    #[instrument(
        skip(self, command),
        fields(sender_id = command.sender_id, receiver_id = command.receiver_id)
    )]
    pub async fn handle_send_message(
        &self,
        command: SendMessageCommand,
    ) -> CourierResult<SendReceipt> {
        if command.content.is_empty() {
            return Err(CourierError::InvalidArgument(
                "content must not be empty".to_string(),
            ));
        }
        validate_user_id(command.sender_id)?;
        validate_user_id(command.receiver_id)?;

        let receipt = self
            .write_service
            .send(command.sender_id, command.receiver_id, command.content)
            .await?;

        info!(
            message_id = %receipt.message.message_id,
            conversation_id = receipt.message.conversation_id,
            "Message stored"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::id_generator::TimeuuidGenerator;
    use crate::testkit::{
        MemoryConversationDirectory, MemoryConversationSummaries, MemoryMessageLog,
        MemoryPairLookup,
    };
    use courier_core::metrics::StorageMetrics;
    use std::time::Duration;

    fn handler() -> MessageCommandHandler {
        let service = MessageWriteService::new(
            Arc::new(MemoryMessageLog::new()),
            Arc::new(MemoryConversationSummaries::new()),
            Arc::new(MemoryConversationDirectory::new()),
            Arc::new(MemoryPairLookup::new()),
            Arc::new(TimeuuidGenerator::new()),
            Arc::new(StorageMetrics::new()),
            0,
            Duration::from_millis(1),
        );
        MessageCommandHandler::new(Arc::new(service))
    }

    #[tokio::test]
    async fn empty_content_is_rejected_at_the_boundary() {
        let result = handler()
            .handle_send_message(SendMessageCommand {
                sender_id: 1,
                receiver_id: 2,
                content: String::new(),
            })
            .await;
        assert!(matches!(result, Err(CourierError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn non_positive_ids_are_rejected_at_the_boundary() {
        let result = handler()
            .handle_send_message(SendMessageCommand {
                sender_id: 0,
                receiver_id: 2,
                content: "hi".to_string(),
            })
            .await;
        assert!(matches!(result, Err(CourierError::InvalidArgument(_))));
    }
}
