//! Chat engine integration layer: seams to the native engine and a
//! file-backed stand-in used by the binary.

pub mod callback_bridge;
pub mod contracts;
pub mod fixture;

pub use contracts::{
    FetchError, FetchedBatch, HistoryFetcher, LoadStatus, NodeExistence, ReactionResolver,
    SdkError,
};

/// Returns the sdk module name for smoke checks.
pub fn module_name() -> &'static str {
    "sdk"
}
