use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::time::Duration;

/// Employees eligible for attendance; the directory lookup applies the same filter.
pub const ACTIVE_EMPLOYEE_IDS: &str = "SELECT id FROM employees WHERE status = 'active'";

/// Employee ids known to exist. Only positive answers are cached, so a
/// newly hired employee is never rejected by a stale entry.
#[derive(Clone)]
pub struct EmployeeCache {
    known: Cache<u64, ()>,
}

impl EmployeeCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            known: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn mark_known(&self, employee_id: u64) {
        self.known.insert(employee_id, ()).await;
    }

    pub async fn is_known(&self, employee_id: u64) -> bool {
        self.known.get(&employee_id).await.is_some()
    }

    async fn batch_mark(&self, ids: &[u64]) {
        let futures: Vec<_> = ids.iter().map(|id| self.known.insert(*id, ())).collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }
}

/// Load active employee ids into the cache (batched)
pub async fn warmup_employee_cache(
    cache: &EmployeeCache,
    pool: &MySqlPool,
    batch_size: usize,
) -> Result<usize> {
    let mut stream = sqlx::query_as::<_, (u64,)>(ACTIVE_EMPLOYEE_IDS).fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (id,) = row?;
        batch.push(id);
        total_count += 1;

        if batch.len() >= batch_size {
            cache.batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        cache.batch_mark(&batch).await;
    }

    tracing::info!(total_count, "Employee cache warmup complete");

    Ok(total_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn remembers_marked_employees() {
        let cache = EmployeeCache::new(16, Duration::from_secs(60));

        assert!(!cache.is_known(7).await);
        cache.mark_known(7).await;
        assert!(cache.is_known(7).await);
        assert!(!cache.is_known(8).await);
    }

    #[actix_web::test]
    async fn batch_mark_covers_every_id() {
        let cache = EmployeeCache::new(16, Duration::from_secs(60));
        cache.batch_mark(&[1, 2, 3]).await;

        for id in [1, 2, 3] {
            assert!(cache.is_known(id).await);
        }
    }
}
