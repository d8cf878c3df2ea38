//! Repository functions — one function per storage operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! Writers hold the pool lock for the whole read-modify-write cycle.

pub mod workflows;
pub mod executions;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use crate::Record;

    /// Minimal record used by the repository tests.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Doc {
        pub id: String,
        pub body: String,
        pub touched_at: Option<DateTime<Utc>>,
    }

    impl Doc {
        pub fn new(id: &str, body: &str) -> Self {
            Self { id: id.into(), body: body.into(), touched_at: None }
        }
    }

    impl Record for Doc {
        fn record_id(&self) -> &str {
            &self.id
        }

        fn touch(&mut self, at: DateTime<Utc>) {
            self.touched_at = Some(at);
        }
    }
}
