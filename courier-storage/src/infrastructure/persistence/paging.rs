//! 游标令牌编解码
//!
//! 驱动返回的续页状态是表相关的不透明字节串；对外包装为
//! URL 安全 base64 文本令牌，调用方在两次调用之间原样传递。
//! 解码失败意味着调用方传入了伪造或损坏的游标，直接拒绝，
//! 不允许原样重试。

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use courier_core::error::{StorageError, StorageResult};
use scylla::response::{PagingState, PagingStateResponse};

use crate::domain::model::PageToken;

/// 将调用方传回的游标解码为驱动续页状态
pub(crate) fn decode_token(resume: Option<&PageToken>) -> StorageResult<PagingState> {
    match resume {
        None => Ok(PagingState::start()),
        Some(token) => {
            let bytes = URL_SAFE_NO_PAD
                .decode(token.as_str())
                .map_err(|_| StorageError::InvalidCursor)?;
            Ok(PagingState::new_from_raw_bytes(bytes))
        }
    }
}

/// 将驱动续页状态编码为对外游标；没有后续页时为 None
pub(crate) fn encode_state(response: PagingStateResponse) -> Option<PageToken> {
    match response {
        PagingStateResponse::HasMorePages { state } => state
            .as_bytes_slice()
            .map(|bytes| PageToken::new(URL_SAFE_NO_PAD.encode(bytes.as_ref()))),
        PagingStateResponse::NoMorePages => None,
    }
}
