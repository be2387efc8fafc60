//! Chat history paging and local message cache.
//!
//! Raw history batches from the chat engine are classified, annotated and
//! written transactionally to a local SQLite cache, which the UI pages through
//! newest first. [`usecases::remote_mediator::ChatMessagesRemoteMediator`]
//! drives the fetches on behalf of the pager.

pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod sdk;
pub mod storage;
pub mod usecases;
