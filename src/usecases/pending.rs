//! Lifecycle of locally queued messages while their files upload.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    domain::pending::{
        NewPendingMessage, PendingMessage, PendingMessageState, PendingTransitionError,
    },
    storage::StoreError,
    usecases::contracts::PendingMessageStore,
};

const PENDING_STATE_CHANGED: &str = "PENDING_STATE_CHANGED";
const PENDING_UNKNOWN_TRANSFER: &str = "PENDING_UNKNOWN_TRANSFER";

#[derive(Debug, Error)]
pub enum PendingMessageError {
    #[error(transparent)]
    Transition(#[from] PendingTransitionError),
    #[error("no pending message is tracking transfer {transfer_tag}")]
    UnknownTransfer { transfer_tag: i32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct PendingMessages {
    store: Arc<dyn PendingMessageStore>,
}

impl PendingMessages {
    pub fn new(store: Arc<dyn PendingMessageStore>) -> Self {
        Self { store }
    }

    pub fn queue(
        &self,
        chat_id: i64,
        file_path: Option<String>,
        timestamp: i64,
    ) -> Result<PendingMessage, PendingMessageError> {
        let pending = self.store.insert_pending(NewPendingMessage {
            chat_id,
            file_path,
            timestamp,
        })?;

        tracing::debug!(
            code = PENDING_STATE_CHANGED,
            id = pending.id,
            chat_id,
            state = pending.state.as_str(),
            "pending message queued"
        );

        Ok(pending)
    }

    pub fn start_upload(
        &self,
        id: i64,
        transfer_tag: i32,
    ) -> Result<PendingMessage, PendingMessageError> {
        let pending = self.load(id)?;
        self.apply(pending, PendingMessageState::Uploading, Some(transfer_tag))
    }

    pub fn transfer_failed(&self, transfer_tag: i32) -> Result<PendingMessage, PendingMessageError> {
        let pending = self.by_transfer(transfer_tag)?;
        let tag = pending.transfer_tag;
        self.apply(pending, PendingMessageState::Error, tag)
    }

    pub fn transfer_finished(
        &self,
        transfer_tag: i32,
    ) -> Result<PendingMessage, PendingMessageError> {
        let pending = self.by_transfer(transfer_tag)?;
        let tag = pending.transfer_tag;
        self.apply(pending, PendingMessageState::Sent, tag)
    }

    /// Puts a failed message back in the queue; the old transfer is forgotten.
    pub fn retry(&self, id: i64) -> Result<PendingMessage, PendingMessageError> {
        let pending = self.load(id)?;
        self.apply(pending, PendingMessageState::Queued, None)
    }

    /// Removes the pending row. Returns `false` if it was already gone.
    pub fn cancel(&self, id: i64) -> Result<bool, PendingMessageError> {
        Ok(self.store.delete_pending(id)?)
    }

    pub fn list(&self, chat_id: i64) -> Result<Vec<PendingMessage>, PendingMessageError> {
        Ok(self.store.pending_messages(chat_id)?)
    }

    fn load(&self, id: i64) -> Result<PendingMessage, PendingMessageError> {
        self.store
            .get_pending(id)?
            .ok_or(PendingMessageError::Store(StoreError::PendingNotFound { id }))
    }

    fn by_transfer(&self, transfer_tag: i32) -> Result<PendingMessage, PendingMessageError> {
        match self.store.get_pending_by_transfer_tag(transfer_tag)? {
            Some(pending) => Ok(pending),
            None => {
                tracing::warn!(
                    code = PENDING_UNKNOWN_TRANSFER,
                    transfer_tag,
                    "transfer update for unknown pending message"
                );
                Err(PendingMessageError::UnknownTransfer { transfer_tag })
            }
        }
    }

    fn apply(
        &self,
        mut pending: PendingMessage,
        next: PendingMessageState,
        transfer_tag: Option<i32>,
    ) -> Result<PendingMessage, PendingMessageError> {
        pending.state = pending.state.transition(next)?;
        pending.transfer_tag = transfer_tag;

        if !self
            .store
            .update_pending_state(pending.id, pending.state, pending.transfer_tag)?
        {
            return Err(StoreError::PendingNotFound { id: pending.id }.into());
        }

        tracing::debug!(
            code = PENDING_STATE_CHANGED,
            id = pending.id,
            chat_id = pending.chat_id,
            state = pending.state.as_str(),
            "pending message state changed"
        );

        Ok(pending)
    }
}
