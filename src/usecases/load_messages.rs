use crate::{
    domain::{message::TypedMessage, paging::Page},
    storage::StoreError,
    usecases::contracts::MessageStore,
};

const DEFAULT_MESSAGES_PAGE_SIZE: usize = 20;
const MAX_MESSAGES_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMessagesQuery {
    pub chat_id: i64,
    pub offset: usize,
    pub limit: usize,
}

impl LoadMessagesQuery {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            offset: 0,
            limit: DEFAULT_MESSAGES_PAGE_SIZE,
        }
    }

    fn normalized_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_MESSAGES_PAGE_SIZE,
            value if value > MAX_MESSAGES_PAGE_SIZE => MAX_MESSAGES_PAGE_SIZE,
            value => value,
        }
    }
}

/// Reads one window of the cached history, newest first.
pub fn load_messages(
    store: &dyn MessageStore,
    query: LoadMessagesQuery,
) -> Result<Page<TypedMessage>, StoreError> {
    store.load_page(query.chat_id, query.offset, query.normalized_limit())
}
