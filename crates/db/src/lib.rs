//! `db` crate — pure persistence layer.
//!
//! Stores each collection (`workflows`, `executions`) as one JSON document
//! under a fixed key, behind a pluggable key-value backend. Repository
//! functions do read-modify-write on whole collections while holding the
//! pool's write lock. No business logic lives here.

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;

pub use error::DbError;
pub use models::Record;
pub use pool::{DbPool, FileBackend, KvBackend, MemoryBackend};
