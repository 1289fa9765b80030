//! Fact-store implementations for Residua.
//!
//! The knowledge base lives in four tabular sources loaded once at
//! process start into an immutable in-memory store, which is then
//! shared read-only behind an `Arc` by every request handler. The core
//! only ever reads.

mod fact_store;
mod loader;

pub use fact_store::InMemoryFactStore;
pub use loader::{load_tables, FactTables, IngestError};
