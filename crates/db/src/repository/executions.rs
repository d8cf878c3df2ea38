//! Execution collection operations.

use tracing::debug;

use crate::{models::EXECUTIONS_KEY, DbError, DbPool, Record};

/// Return every stored execution in creation order.
pub async fn list_executions<E: Record>(pool: &DbPool) -> Result<Vec<E>, DbError> {
    pool.load(EXECUTIONS_KEY).await
}

/// Fetch a single execution by id.
pub async fn get_execution<E: Record>(pool: &DbPool, id: &str) -> Result<E, DbError> {
    list_executions::<E>(pool)
        .await?
        .into_iter()
        .find(|e| e.record_id() == id)
        .ok_or(DbError::NotFound)
}

/// Append a new execution record.
pub async fn append_execution<E: Record>(pool: &DbPool, execution: E) -> Result<(), DbError> {
    let _guard = pool.lock().await;
    let mut all: Vec<E> = pool.load(EXECUTIONS_KEY).await?;
    debug!("Appending execution {}", execution.record_id());
    all.push(execution);
    pool.store(EXECUTIONS_KEY, &all).await
}

/// Apply `patch` to the execution with the given id and persist the result.
///
/// The whole read-patch-write runs under the pool lock, so two executions
/// resolving at the same instant cannot overwrite each other.
///
/// Returns the patched record, or `DbError::NotFound`.
pub async fn patch_execution<E, F>(pool: &DbPool, id: &str, patch: F) -> Result<E, DbError>
where
    E: Record,
    F: FnOnce(&mut E),
{
    let _guard = pool.lock().await;
    let mut all: Vec<E> = pool.load(EXECUTIONS_KEY).await?;

    let record = all
        .iter_mut()
        .find(|e| e.record_id() == id)
        .ok_or(DbError::NotFound)?;
    patch(record);
    let patched = record.clone();

    pool.store(EXECUTIONS_KEY, &all).await?;
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Doc;

    #[tokio::test]
    async fn append_preserves_order() {
        let pool = DbPool::in_memory();
        append_execution(&pool, Doc::new("1", "first")).await.unwrap();
        append_execution(&pool, Doc::new("2", "second")).await.unwrap();

        let all: Vec<Doc> = list_executions(&pool).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn patch_updates_only_the_matching_record() {
        let pool = DbPool::in_memory();
        append_execution(&pool, Doc::new("1", "a")).await.unwrap();
        append_execution(&pool, Doc::new("2", "b")).await.unwrap();

        let patched: Doc = patch_execution(&pool, "2", |d: &mut Doc| d.body = "patched".into())
            .await
            .unwrap();
        assert_eq!(patched.body, "patched");

        let first: Doc = get_execution(&pool, "1").await.unwrap();
        assert_eq!(first.body, "a");
    }

    #[tokio::test]
    async fn patch_of_missing_execution_is_not_found() {
        let pool = DbPool::in_memory();
        let result = patch_execution(&pool, "ghost", |_: &mut Doc| {}).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn concurrent_patches_are_not_lost() {
        let pool = DbPool::in_memory();
        for i in 0..8 {
            append_execution(&pool, Doc::new(&i.to_string(), "pending")).await.unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                patch_execution(&pool, &i.to_string(), |d: &mut Doc| d.body = "done".into())
                    .await
                    .map(|_: Doc| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all: Vec<Doc> = list_executions(&pool).await.unwrap();
        assert!(all.iter().all(|d| d.body == "done"));
    }
}
