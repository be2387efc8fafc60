use tokio::sync::watch;

use crate::{
    domain::{
        message::TypedMessage,
        meta::{ChatGeolocation, ChatNode, Giphy, RichPreview},
        paging::Page,
        pending::{NewPendingMessage, PendingMessage, PendingMessageState},
    },
    storage::StoreError,
};

/// Everything one save request produces, written in a single transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreBatch {
    pub messages: Vec<TypedMessage>,
    pub rich_previews: Vec<RichPreview>,
    pub giphys: Vec<Giphy>,
    pub geolocations: Vec<ChatGeolocation>,
    pub nodes: Vec<ChatNode>,
}

impl StoreBatch {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.rich_previews.is_empty()
            && self.giphys.is_empty()
            && self.geolocations.is_empty()
            && self.nodes.is_empty()
    }
}

/// Transactional cache of typed messages and their meta-attachments.
pub trait MessageStore: Send + Sync {
    fn store_messages(&self, batch: StoreBatch) -> Result<(), StoreError>;

    fn clear_chat_messages(&self, chat_id: i64) -> Result<(), StoreError>;

    /// The stored message immediately after `timestamp`, if any.
    fn get_next_message(
        &self,
        chat_id: i64,
        timestamp: i64,
    ) -> Result<Option<TypedMessage>, StoreError>;

    fn get_message(&self, chat_id: i64, msg_id: i64) -> Result<Option<TypedMessage>, StoreError>;

    /// Replaces an existing row. Returns `false` if the row is not stored.
    fn update_message(&self, message: TypedMessage) -> Result<bool, StoreError>;

    /// Soft delete: the row is kept but no longer paged.
    fn delete_message(&self, chat_id: i64, msg_id: i64) -> Result<bool, StoreError>;

    fn message_count(&self, chat_id: i64) -> Result<usize, StoreError>;

    /// Reverse-chronological window over non-deleted messages.
    fn load_page(
        &self,
        chat_id: i64,
        offset: usize,
        size: usize,
    ) -> Result<Page<TypedMessage>, StoreError>;

    fn get_rich_preview(&self, message_id: i64) -> Result<Option<RichPreview>, StoreError>;

    fn get_giphy(&self, message_id: i64) -> Result<Option<Giphy>, StoreError>;

    fn get_geolocation(&self, message_id: i64) -> Result<Option<ChatGeolocation>, StoreError>;

    fn get_nodes(&self, message_id: i64) -> Result<Vec<ChatNode>, StoreError>;

    /// Bumped once per committed write; paging consumers re-query on change.
    fn subscribe_invalidation(&self) -> watch::Receiver<u64>;
}

pub trait PendingMessageStore: Send + Sync {
    fn insert_pending(&self, message: NewPendingMessage) -> Result<PendingMessage, StoreError>;

    fn get_pending(&self, id: i64) -> Result<Option<PendingMessage>, StoreError>;

    fn get_pending_by_transfer_tag(
        &self,
        transfer_tag: i32,
    ) -> Result<Option<PendingMessage>, StoreError>;

    fn pending_messages(&self, chat_id: i64) -> Result<Vec<PendingMessage>, StoreError>;

    fn update_pending_state(
        &self,
        id: i64,
        state: PendingMessageState,
        transfer_tag: Option<i32>,
    ) -> Result<bool, StoreError>;

    fn delete_pending(&self, id: i64) -> Result<bool, StoreError>;
}
