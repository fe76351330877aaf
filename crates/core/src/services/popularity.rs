//! Popularity aggregation service.
//!
//! Trending categories, tags and content over the two content tables.
//! Unlike the reaction counters these caches carry a bounded lifetime: the
//! aggregates are expensive scans and a day of staleness is acceptable.

use folio_common::{AppError, AppResult, CounterBackend, CounterStore, keys};
use folio_db::repositories::{PopularityRepository, PopularityRow, TrendingContentRow};
use std::time::Duration;

/// Popularity cache lifetime.
const POPULARITY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How many entries each aggregate returns.
const POPULARITY_LIMIT: u64 = 7;

/// Popularity service for business logic.
#[derive(Clone)]
pub struct PopularityService {
    popularity_repo: PopularityRepository,
    counters: CounterStore,
}

impl PopularityService {
    /// Create a new popularity service.
    #[must_use]
    pub fn new(popularity_repo: PopularityRepository, counters: CounterStore) -> Self {
        Self {
            popularity_repo,
            counters,
        }
    }

    /// Most-used categories across published content (cached 24h).
    pub async fn categories(&self) -> AppResult<Vec<PopularityRow>> {
        let key = keys::popularity("categories");

        if let Some(cached) = self.counters.get_json(&key).await? {
            return serde_json::from_value(cached).map_err(|e| AppError::Cache(e.to_string()));
        }

        let rows = self.popularity_repo.top_categories(POPULARITY_LIMIT).await?;
        self.store(&key, &rows).await?;
        Ok(rows)
    }

    /// Most-used tags across published content (cached 24h).
    pub async fn tags(&self) -> AppResult<Vec<PopularityRow>> {
        let key = keys::popularity("tags");

        if let Some(cached) = self.counters.get_json(&key).await? {
            return serde_json::from_value(cached).map_err(|e| AppError::Cache(e.to_string()));
        }

        let rows = self.popularity_repo.top_tags(POPULARITY_LIMIT).await?;
        self.store(&key, &rows).await?;
        Ok(rows)
    }

    /// Most-liked content from the reaction ledger (cached 24h).
    pub async fn articles(&self) -> AppResult<Vec<TrendingContentRow>> {
        let key = keys::popularity("articles");

        if let Some(cached) = self.counters.get_json(&key).await? {
            return serde_json::from_value(cached).map_err(|e| AppError::Cache(e.to_string()));
        }

        let rows = self.popularity_repo.top_content(POPULARITY_LIMIT).await?;
        self.store(&key, &rows).await?;
        Ok(rows)
    }

    async fn store<T: serde::Serialize>(&self, key: &str, rows: &T) -> AppResult<()> {
        let payload = serde_json::to_value(rows).map_err(|e| AppError::Cache(e.to_string()))?;
        self.counters
            .set_json_with_ttl(key, &payload, POPULARITY_TTL)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use folio_common::MemoryCounterStore;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service_with(db: sea_orm::DatabaseConnection) -> PopularityService {
        let repo = PopularityRepository::new(Arc::new(db));
        PopularityService::new(repo, Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_categories_fill_then_cache() {
        let rows = vec![PopularityRow {
            name: "engineering".to_string(),
            count: 12,
        }];

        // One aggregate result in the mock; the second call must be served
        // from cache.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let service = service_with(db);

        let first = service.categories().await.unwrap();
        let second = service.categories().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].name, "engineering");
    }

    #[tokio::test]
    async fn test_articles_aggregate() {
        let rows = vec![TrendingContentRow {
            target_type: "article".to_string(),
            target_id: "42".to_string(),
            count: 9,
        }];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let service = service_with(db);
        let result = service.articles().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].target_id, "42");
    }
}
