//! Use case layer: classification, persistence and paging workflows.

pub mod bootstrap;
pub mod classify;
pub mod context;
pub mod contracts;
pub mod load_messages;
pub mod pending;
pub mod remote_mediator;
pub mod save_messages;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
