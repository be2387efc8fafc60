//! Bridges pager load requests to the chat engine's history fetch.
//!
//! History is only ever extended backwards in time: prepend requests end
//! immediately, refresh clears the local copy and starts over from the newest
//! message, and append keeps fetching engine batches until the page is filled
//! or the engine reports there is nothing older. A page is written to the
//! store once, after the whole page has been fetched.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    domain::{
        message::RawMessage,
        paging::{LoadType, MediatorState, PagingState},
    },
    sdk::{FetchError, HistoryFetcher, LoadStatus},
    storage::StoreError,
    usecases::{contracts::MessageStore, save_messages::SaveChatMessages},
};

const MEDIATOR_LOAD_STARTED: &str = "MEDIATOR_LOAD_STARTED";
const MEDIATOR_LOAD_FINISHED: &str = "MEDIATOR_LOAD_FINISHED";
const MEDIATOR_LOAD_FAILED: &str = "MEDIATOR_LOAD_FAILED";
const MEDIATOR_FETCH_CAP_REACHED: &str = "MEDIATOR_FETCH_CAP_REACHED";

pub const DEFAULT_MAX_FETCHES_PER_LOAD: usize = 32;

#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("history fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("message store write failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub enum MediatorResult {
    Success { end_of_pagination_reached: bool },
    Error(MediatorError),
}

impl MediatorResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MediatorResult::Success { .. })
    }

    pub fn end_of_pagination_reached(&self) -> Option<bool> {
        match self {
            MediatorResult::Success {
                end_of_pagination_reached,
            } => Some(*end_of_pagination_reached),
            MediatorResult::Error(_) => None,
        }
    }
}

/// Watermark of what has been fetched since the last refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchCursor {
    pub fetched_messages: usize,
    pub oldest_timestamp: Option<i64>,
    pub exhausted: bool,
}

pub struct ChatMessagesRemoteMediator {
    chat_id: i64,
    my_handle: i64,
    fetcher: Arc<dyn HistoryFetcher>,
    store: Arc<dyn MessageStore>,
    saver: SaveChatMessages,
    max_fetches_per_load: usize,
    cursor: Mutex<FetchCursor>,
    state_tx: watch::Sender<MediatorState>,
}

impl ChatMessagesRemoteMediator {
    pub fn new(
        chat_id: i64,
        my_handle: i64,
        fetcher: Arc<dyn HistoryFetcher>,
        store: Arc<dyn MessageStore>,
        saver: SaveChatMessages,
    ) -> Self {
        let (state_tx, _) = watch::channel(MediatorState::Idle);

        Self {
            chat_id,
            my_handle,
            fetcher,
            store,
            saver,
            max_fetches_per_load: DEFAULT_MAX_FETCHES_PER_LOAD,
            cursor: Mutex::new(FetchCursor::default()),
            state_tx,
        }
    }

    /// Upper bound of engine round-trips a single load may issue.
    pub fn with_max_fetches_per_load(mut self, max_fetches_per_load: usize) -> Self {
        self.max_fetches_per_load = max_fetches_per_load.max(1);
        self
    }

    pub fn state(&self) -> MediatorState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MediatorState> {
        self.state_tx.subscribe()
    }

    pub fn cursor(&self) -> FetchCursor {
        *self.cursor.lock()
    }

    /// Never returns an error through `Err`: failures are reported as
    /// [`MediatorResult::Error`] and retrying is left to the caller.
    pub async fn load(&self, load_type: LoadType, paging_state: &PagingState) -> MediatorResult {
        if load_type == LoadType::Prepend {
            self.set_state(MediatorState::Success { end_reached: true });
            return MediatorResult::Success {
                end_of_pagination_reached: true,
            };
        }

        let target = match load_type {
            LoadType::Refresh => paging_state.initial_load_size,
            _ => paging_state.page_size,
        };

        tracing::debug!(
            code = MEDIATOR_LOAD_STARTED,
            chat_id = self.chat_id,
            load_type = load_type.as_str(),
            target,
            "mediator load started"
        );
        self.set_state(MediatorState::Fetching);

        let outcome = match load_type {
            LoadType::Refresh => match self.reset().await {
                Ok(()) => self.fetch_page(target).await,
                Err(error) => Err(error),
            },
            _ => self.fetch_page(target).await,
        };

        match outcome {
            Ok(end_reached) => {
                tracing::info!(
                    code = MEDIATOR_LOAD_FINISHED,
                    chat_id = self.chat_id,
                    load_type = load_type.as_str(),
                    end_reached,
                    "mediator load finished"
                );
                self.set_state(MediatorState::Success { end_reached });
                MediatorResult::Success {
                    end_of_pagination_reached: end_reached,
                }
            }
            Err(error) => {
                tracing::warn!(
                    code = MEDIATOR_LOAD_FAILED,
                    chat_id = self.chat_id,
                    load_type = load_type.as_str(),
                    error = %error,
                    "mediator load failed"
                );
                self.set_state(MediatorState::Error {
                    message: error.to_string(),
                });
                MediatorResult::Error(error)
            }
        }
    }

    async fn reset(&self) -> Result<(), MediatorError> {
        self.store.clear_chat_messages(self.chat_id)?;
        *self.cursor.lock() = FetchCursor::default();
        self.fetcher.reset_history(self.chat_id).await?;
        Ok(())
    }

    /// Returns whether the engine has no older history left.
    async fn fetch_page(&self, target: usize) -> Result<bool, MediatorError> {
        let mut accumulated: Vec<RawMessage> = Vec::new();
        let mut fetches = 0;

        let end_reached = loop {
            let batch = self.fetcher.fetch_one_batch(self.chat_id).await?;
            fetches += 1;
            accumulated.extend(batch.messages);

            if batch.load_status == LoadStatus::None {
                break true;
            }
            if page_filled(accumulated.len(), target) {
                break false;
            }
            if fetches >= self.max_fetches_per_load {
                tracing::warn!(
                    code = MEDIATOR_FETCH_CAP_REACHED,
                    chat_id = self.chat_id,
                    fetches,
                    accumulated = accumulated.len(),
                    "fetch cap reached before the page was filled"
                );
                break false;
            }
        };

        let oldest = accumulated.iter().map(|message| message.timestamp).min();
        let saved = self
            .saver
            .save(self.chat_id, accumulated, self.my_handle, None)
            .await?;

        let mut cursor = self.cursor.lock();
        cursor.fetched_messages += saved;
        cursor.oldest_timestamp = match (cursor.oldest_timestamp, oldest) {
            (Some(current), Some(new)) => Some(current.min(new)),
            (current, new) => current.or(new),
        };
        cursor.exhausted = end_reached;

        Ok(end_reached)
    }

    fn set_state(&self, state: MediatorState) {
        self.state_tx.send_replace(state);
    }
}

/// A page counts as filled once the accumulated messages exceed the target.
fn page_filled(accumulated: usize, target: usize) -> bool {
    accumulated > target
}
