//! File-backed chat engine used by the `sync` command and in tests.
//!
//! History is served newest first in fixed-size batches from a worker thread,
//! completing through the same callback bridge a native engine binding uses.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::message::{RawMessage, Reaction},
    sdk::{
        callback_bridge::{await_callback, OneShotCallback},
        contracts::{
            FetchError, FetchedBatch, HistoryFetcher, LoadStatus, NodeExistence,
            ReactionResolver, SdkError,
        },
    },
};

const FIXTURE_BATCH_SERVED: &str = "FIXTURE_BATCH_SERVED";
const FIXTURE_REQUEST_CANCELLED: &str = "FIXTURE_REQUEST_CANCELLED";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read history fixture at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse history fixture at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryFixture {
    pub my_handle: i64,
    #[serde(default)]
    pub chats: HashMap<i64, Vec<RawMessage>>,
    /// Resolved reactions keyed by message id.
    #[serde(default)]
    pub reactions: HashMap<i64, Vec<Reaction>>,
    #[serde(default)]
    pub deleted_nodes: HashSet<i64>,
}

impl HistoryFixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FixtureHistory {
    inner: Arc<FixtureInner>,
}

#[derive(Debug)]
struct FixtureInner {
    my_handle: i64,
    /// Newest first, per chat.
    history: HashMap<i64, Vec<RawMessage>>,
    reactions: HashMap<i64, Vec<Reaction>>,
    deleted_nodes: HashSet<i64>,
    batch_size: usize,
    cursors: Mutex<HashMap<i64, usize>>,
}

impl FixtureHistory {
    pub fn new(fixture: HistoryFixture, batch_size: usize) -> Self {
        let history = fixture
            .chats
            .into_iter()
            .map(|(chat_id, mut messages)| {
                messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                (chat_id, messages)
            })
            .collect();

        Self {
            inner: Arc::new(FixtureInner {
                my_handle: fixture.my_handle,
                history,
                reactions: fixture.reactions,
                deleted_nodes: fixture.deleted_nodes,
                batch_size: batch_size.max(1),
                cursors: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn my_handle(&self) -> i64 {
        self.inner.my_handle
    }
}

impl FixtureInner {
    fn next_batch(&self, chat_id: i64) -> Result<FetchedBatch, FetchError> {
        let history = self
            .history
            .get(&chat_id)
            .ok_or(FetchError::ChatNotFound { chat_id })?;

        let mut cursors = self.cursors.lock();
        let cursor = cursors.entry(chat_id).or_insert(0);
        let start = (*cursor).min(history.len());
        let end = (start + self.batch_size).min(history.len());
        *cursor = end;

        let load_status = if end < history.len() {
            LoadStatus::More
        } else {
            LoadStatus::None
        };

        Ok(FetchedBatch {
            messages: history[start..end].to_vec(),
            load_status,
        })
    }
}

#[async_trait]
impl HistoryFetcher for FixtureHistory {
    async fn fetch_one_batch(&self, chat_id: i64) -> Result<FetchedBatch, FetchError> {
        let inner = Arc::clone(&self.inner);

        await_callback(
            move |mut callback: OneShotCallback<Result<FetchedBatch, FetchError>>| {
                thread::spawn(move || {
                    if callback.is_cancelled() {
                        tracing::debug!(
                            code = FIXTURE_REQUEST_CANCELLED,
                            chat_id,
                            "history request cancelled before it was served"
                        );
                        return;
                    }

                    let batch = inner.next_batch(chat_id);
                    if let Ok(batch) = &batch {
                        tracing::debug!(
                            code = FIXTURE_BATCH_SERVED,
                            chat_id,
                            count = batch.messages.len(),
                            more = batch.load_status == LoadStatus::More,
                            "history batch served"
                        );
                    }
                    callback.complete(batch);
                });
            },
        )
        .await?
    }

    async fn reset_history(&self, chat_id: i64) -> Result<(), FetchError> {
        self.inner.cursors.lock().remove(&chat_id);
        Ok(())
    }
}

#[async_trait]
impl ReactionResolver for FixtureHistory {
    async fn get_reactions(
        &self,
        _chat_id: i64,
        msg_id: i64,
        _my_handle: i64,
    ) -> Result<Vec<Reaction>, SdkError> {
        Ok(self
            .inner
            .reactions
            .get(&msg_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl NodeExistence for FixtureHistory {
    async fn does_node_exist(&self, node_id: i64) -> Result<bool, SdkError> {
        Ok(!self.inner.deleted_nodes.contains(&node_id))
    }
}
