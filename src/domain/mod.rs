//! Domain layer: chat message entities, meta-attachments and paging types.

pub mod message;
pub mod meta;
pub mod paging;
pub mod pending;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
