use async_trait::async_trait;
use thiserror::Error;

use crate::domain::message::{RawMessage, Reaction};

/// Whether the engine has older history left after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    None,
    More,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBatch {
    pub messages: Vec<RawMessage>,
    pub load_status: LoadStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("chat engine request failed with code {code}: {message}")]
    Engine { code: i32, message: String },
    #[error("chat engine dropped the completion callback")]
    CallbackDropped,
    #[error("chat {chat_id} is not available")]
    ChatNotFound { chat_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("chat engine request failed with code {code}: {message}")]
    Engine { code: i32, message: String },
    #[error("chat engine dropped the completion callback")]
    CallbackDropped,
}

/// Loads chat history one batch at a time, newest first.
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    async fn fetch_one_batch(&self, chat_id: i64) -> Result<FetchedBatch, FetchError>;

    /// Rewinds the engine's history cursor to the newest message.
    async fn reset_history(&self, _chat_id: i64) -> Result<(), FetchError> {
        Ok(())
    }
}

#[async_trait]
pub trait ReactionResolver: Send + Sync {
    async fn get_reactions(
        &self,
        chat_id: i64,
        msg_id: i64,
        my_handle: i64,
    ) -> Result<Vec<Reaction>, SdkError>;
}

#[async_trait]
pub trait NodeExistence: Send + Sync {
    async fn does_node_exist(&self, node_id: i64) -> Result<bool, SdkError>;
}
