//! # benchjudge-store
//!
//! Persistence boundary for evaluation runs.
//!
//! - [`EvalStore`] - Async trait the dispatcher and CLI talk to
//! - [`InMemoryEvalStore`] - Process-local store, used by tests
//! - `SqliteEvalStore` - SQLite store behind the `sqlite` feature

pub mod inmemory;
pub mod service;

#[cfg(feature = "sqlite")]
pub mod database;

pub use inmemory::InMemoryEvalStore;
pub use service::{EvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion};

#[cfg(feature = "sqlite")]
pub use database::SqliteEvalStore;
