//! Kind-catalog error type.

use thiserror::Error;

/// Errors returned when a kind name does not belong to one of the closed
/// catalogs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KindError {
    #[error("unknown trigger type: '{0}'")]
    UnknownTriggerType(String),

    #[error("unknown action type: '{0}'")]
    UnknownActionType(String),
}
