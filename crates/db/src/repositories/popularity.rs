//! Popularity aggregation queries.
//!
//! Raw-SQL aggregates spanning both content tables. These back the
//! short-lived popularity caches; they are too hot to run per request.

use std::sync::Arc;

use folio_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::{Deserialize, Serialize};

/// One named aggregate row (a category or tag with its usage count).
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct PopularityRow {
    /// Category or tag name.
    pub name: String,
    /// Number of content items carrying it.
    pub count: i64,
}

/// One trending content row (a target with its like count).
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct TrendingContentRow {
    /// Content kind (`article` or `news`).
    pub target_type: String,
    /// Content identifier.
    pub target_id: String,
    /// Like count over the reaction ledger.
    pub count: i64,
}

#[cfg(any(test, feature = "test-utils"))]
impl sea_orm::IntoMockRow for PopularityRow {
    fn into_mock_row(self) -> sea_orm::MockRow {
        let mut values = std::collections::BTreeMap::<String, sea_orm::Value>::new();
        values.insert("name".to_owned(), self.name.into());
        values.insert("count".to_owned(), self.count.into());
        sea_orm::IntoMockRow::into_mock_row(values)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl sea_orm::IntoMockRow for TrendingContentRow {
    fn into_mock_row(self) -> sea_orm::MockRow {
        let mut values = std::collections::BTreeMap::<String, sea_orm::Value>::new();
        values.insert("target_type".to_owned(), self.target_type.into());
        values.insert("target_id".to_owned(), self.target_id.into());
        values.insert("count".to_owned(), self.count.into());
        sea_orm::IntoMockRow::into_mock_row(values)
    }
}

/// Popularity repository over the content and reaction tables.
#[derive(Clone)]
pub struct PopularityRepository {
    db: Arc<DatabaseConnection>,
}

impl PopularityRepository {
    /// Create a new popularity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Most-used categories across published articles and news.
    pub async fn top_categories(&self, limit: u64) -> AppResult<Vec<PopularityRow>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"SELECT category AS name, COUNT(*) AS count
              FROM (
                  SELECT category FROM article WHERE published_at IS NOT NULL
                  UNION ALL
                  SELECT category FROM news WHERE published_at IS NOT NULL
              ) AS contents
              GROUP BY category
              ORDER BY count DESC
              LIMIT $1",
            [(limit as i64).into()],
        );

        PopularityRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most-used tags across published articles and news.
    pub async fn top_tags(&self, limit: u64) -> AppResult<Vec<PopularityRow>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"SELECT tag AS name, COUNT(*) AS count
              FROM (
                  SELECT jsonb_array_elements_text(tags) AS tag
                  FROM article WHERE published_at IS NOT NULL
                  UNION ALL
                  SELECT jsonb_array_elements_text(tags) AS tag
                  FROM news WHERE published_at IS NOT NULL
              ) AS content_tags
              GROUP BY tag
              ORDER BY count DESC
              LIMIT $1",
            [(limit as i64).into()],
        );

        PopularityRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most-liked content across both content types, from the reaction ledger.
    pub async fn top_content(&self, limit: u64) -> AppResult<Vec<TrendingContentRow>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"SELECT target_type, target_id, COUNT(*) AS count
              FROM reaction
              WHERE kind = 'like' AND target_type IN ('article', 'news')
              GROUP BY target_type, target_id
              ORDER BY count DESC
              LIMIT $1",
            [(limit as i64).into()],
        );

        TrendingContentRow::find_by_statement(statement)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_top_categories_ordering_passthrough() {
        let rows = vec![
            PopularityRow {
                name: "engineering".to_string(),
                count: 12,
            },
            PopularityRow {
                name: "design".to_string(),
                count: 7,
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );

        let repo = PopularityRepository::new(db);
        let result = repo.top_categories(7).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "engineering");
        assert!(result[0].count >= result[1].count);
    }

    #[tokio::test]
    async fn test_top_content() {
        let rows = vec![TrendingContentRow {
            target_type: "article".to_string(),
            target_id: "42".to_string(),
            count: 3,
        }];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );

        let repo = PopularityRepository::new(db);
        let result = repo.top_content(7).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].target_type, "article");
    }
}
