//! Local message store backed by SQLite.

mod error;
mod pending_store;
mod rows;
mod schema;
mod sqlite_store;

pub use error::StoreError;
pub use sqlite_store::SqliteMessageStore;

/// Returns the storage module name for smoke checks.
pub fn module_name() -> &'static str {
    "storage"
}
