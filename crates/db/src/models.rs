//! The contract a type must meet to be stored in a collection.
//!
//! Domain types live in the `engine` crate; the repositories only need to
//! know how to identify a record and how to stamp it on save.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Collection key for workflow definitions.
pub const WORKFLOWS_KEY: &str = "workflows";
/// Collection key for execution records.
pub const EXECUTIONS_KEY: &str = "executions";

/// A record stored in a JSON collection and matched by its string id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The record's identity within its collection.
    fn record_id(&self) -> &str;

    /// Called by upserting repository functions just before the write.
    fn touch(&mut self, _at: DateTime<Utc>) {}
}
