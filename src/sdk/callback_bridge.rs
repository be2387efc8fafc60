//! Turns the engine's one-shot completion callbacks into awaitable futures.
//!
//! The starter receives a [`OneShotCallback`] and hands it to whatever thread
//! the engine completes requests on. The awaiting side resolves on the first
//! completion; later completions are ignored. If the awaiting future is dropped
//! first, the callback's [`CancelHandle`] reports cancellation so the engine
//! request can be abandoned.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::sdk::contracts::{FetchError, SdkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("completion callback dropped before completing")]
pub struct CallbackDropped;

impl From<CallbackDropped> for FetchError {
    fn from(_: CallbackDropped) -> Self {
        FetchError::CallbackDropped
    }
}

impl From<CallbackDropped> for SdkError {
    fn from(_: CallbackDropped) -> Self {
        SdkError::CallbackDropped
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct OneShotCallback<T> {
    tx: Option<oneshot::Sender<T>>,
    cancel: CancelHandle,
}

impl<T> OneShotCallback<T> {
    /// Delivers the result. Returns `false` when it was already delivered or
    /// nobody is waiting anymore.
    pub fn complete(&mut self, value: T) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct CancelOnDrop(Option<CancelHandle>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0.take();
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.cancel();
        }
    }
}

/// Starts an engine request and waits for its completion callback.
pub async fn await_callback<T, F>(start: F) -> Result<T, CallbackDropped>
where
    F: FnOnce(OneShotCallback<T>),
{
    let (tx, rx) = oneshot::channel();
    let cancel = CancelHandle::default();
    let guard = CancelOnDrop(Some(cancel.clone()));

    start(OneShotCallback {
        tx: Some(tx),
        cancel,
    });

    let result = rx.await.map_err(|_| CallbackDropped);
    guard.disarm();
    result
}
