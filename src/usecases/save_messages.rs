use std::sync::Arc;

use crate::{
    domain::message::RawMessage,
    storage::StoreError,
    usecases::{
        classify::MessageClassifier,
        contracts::{MessageStore, StoreBatch},
    },
};

/// Classifies a batch of raw messages and persists it in one store write.
#[derive(Clone)]
pub struct SaveChatMessages {
    classifier: MessageClassifier,
    store: Arc<dyn MessageStore>,
}

impl SaveChatMessages {
    pub fn new(classifier: MessageClassifier, store: Arc<dyn MessageStore>) -> Self {
        Self { classifier, store }
    }

    /// Returns the number of messages written.
    ///
    /// Without an explicit `next_message_user_handle`, the sender of the stored
    /// message following the newest message of the batch is used.
    pub async fn save(
        &self,
        chat_id: i64,
        messages: Vec<RawMessage>,
        my_handle: i64,
        next_message_user_handle: Option<i64>,
    ) -> Result<usize, StoreError> {
        let Some(newest) = messages.iter().map(|message| message.timestamp).max() else {
            return Ok(0);
        };

        let next_sender = match next_message_user_handle {
            Some(handle) => Some(handle),
            None => self
                .store
                .get_next_message(chat_id, newest)?
                .map(|message| message.user_handle),
        };

        let requests = self
            .classifier
            .classify_batch(chat_id, messages, my_handle, next_sender)
            .await;

        let mut batch = StoreBatch::default();
        for request in &requests {
            request.append_rows(&mut batch);
        }

        let count = batch.messages.len();
        self.store.store_messages(batch)?;
        Ok(count)
    }
}
