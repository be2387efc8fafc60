use std::sync::Arc;

use crate::{
    domain::paging::PagingState,
    infra::config::AppConfig,
    sdk::{HistoryFetcher, NodeExistence, ReactionResolver},
    storage::SqliteMessageStore,
    usecases::{
        classify::MessageClassifier, pending::PendingMessages,
        remote_mediator::ChatMessagesRemoteMediator, save_messages::SaveChatMessages,
    },
};

#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<SqliteMessageStore>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<SqliteMessageStore>) -> Self {
        Self { config, store }
    }

    pub fn paging_state(&self) -> PagingState {
        PagingState {
            page_size: self.config.paging.page_size,
            initial_load_size: self.config.paging.initial_load_size,
        }
    }

    /// Builds the mediator for one opened chat; the engine serves all three seams.
    pub fn mediator_for<E>(
        &self,
        chat_id: i64,
        my_handle: i64,
        engine: Arc<E>,
    ) -> ChatMessagesRemoteMediator
    where
        E: HistoryFetcher + ReactionResolver + NodeExistence + 'static,
    {
        let classifier = MessageClassifier::new(engine.clone(), engine.clone());
        let saver = SaveChatMessages::new(classifier, self.store.clone());

        ChatMessagesRemoteMediator::new(chat_id, my_handle, engine, self.store.clone(), saver)
            .with_max_fetches_per_load(self.config.paging.max_fetches_per_load)
    }

    pub fn pending_messages(&self) -> PendingMessages {
        PendingMessages::new(self.store.clone())
    }
}
