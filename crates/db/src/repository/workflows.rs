//! Workflow collection operations.

use chrono::Utc;
use tracing::info;

use crate::{models::WORKFLOWS_KEY, DbError, DbPool, Record};

/// Return every stored workflow in insertion order.
pub async fn list_workflows<W: Record>(pool: &DbPool) -> Result<Vec<W>, DbError> {
    pool.load(WORKFLOWS_KEY).await
}

/// Fetch a single workflow by id.
pub async fn get_workflow<W: Record>(pool: &DbPool, id: &str) -> Result<W, DbError> {
    list_workflows::<W>(pool)
        .await?
        .into_iter()
        .find(|w| w.record_id() == id)
        .ok_or(DbError::NotFound)
}

/// Insert or replace a workflow by id, stamping it via [`Record::touch`].
///
/// Returns the full collection as stored after the write.
pub async fn save_workflow<W: Record>(pool: &DbPool, mut workflow: W) -> Result<Vec<W>, DbError> {
    let _guard = pool.lock().await;
    let mut all: Vec<W> = pool.load(WORKFLOWS_KEY).await?;

    workflow.touch(Utc::now());
    match all.iter_mut().find(|w| w.record_id() == workflow.record_id()) {
        Some(existing) => *existing = workflow,
        None => {
            info!("Storing new workflow {}", workflow.record_id());
            all.push(workflow);
        }
    }

    pool.store(WORKFLOWS_KEY, &all).await?;
    Ok(all)
}

/// Permanently delete a workflow by id.
///
/// Returns `DbError::NotFound` if no record was removed.
pub async fn delete_workflow<W: Record>(pool: &DbPool, id: &str) -> Result<(), DbError> {
    let _guard = pool.lock().await;
    let mut all: Vec<W> = pool.load(WORKFLOWS_KEY).await?;

    let before = all.len();
    all.retain(|w| w.record_id() != id);
    if all.len() == before {
        return Err(DbError::NotFound);
    }

    pool.store(WORKFLOWS_KEY, &all).await?;
    info!("Deleted workflow {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Doc;

    #[tokio::test]
    async fn save_inserts_then_replaces_by_id() {
        let pool = DbPool::in_memory();

        let all = save_workflow(&pool, Doc::new("a", "one")).await.unwrap();
        assert_eq!(all.len(), 1);

        let all = save_workflow(&pool, Doc::new("a", "two")).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body, "two");
    }

    #[tokio::test]
    async fn save_stamps_the_record() {
        let pool = DbPool::in_memory();
        let all = save_workflow(&pool, Doc::new("a", "x")).await.unwrap();
        assert!(all[0].touched_at.is_some());
    }

    #[tokio::test]
    async fn get_missing_workflow_is_not_found() {
        let pool = DbPool::in_memory();
        save_workflow(&pool, Doc::new("a", "x")).await.unwrap();

        let found: Doc = get_workflow(&pool, "a").await.unwrap();
        assert_eq!(found.body, "x");
        assert!(matches!(get_workflow::<Doc>(&pool, "b").await, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn delete_removes_only_the_matching_record() {
        let pool = DbPool::in_memory();
        save_workflow(&pool, Doc::new("a", "x")).await.unwrap();
        save_workflow(&pool, Doc::new("b", "y")).await.unwrap();

        delete_workflow::<Doc>(&pool, "a").await.unwrap();
        let remaining: Vec<Doc> = list_workflows(&pool).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");

        assert!(matches!(delete_workflow::<Doc>(&pool, "a").await, Err(DbError::NotFound)));
    }
}
