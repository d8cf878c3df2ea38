//! `nodes` crate — the task-kind catalogs and their default parameter schemas.
//!
//! Every task created or re-typed by the engine is seeded from
//! [`schemas`], so the sub-fields checked by validation always have a
//! baseline value.

pub mod error;
pub mod kinds;
pub mod params;
pub mod schemas;

pub use error::KindError;
pub use kinds::{ActionType, TriggerType};

/// Free-form, kind-specific task parameters.
pub type Parameters = serde_json::Map<String, serde_json::Value>;
