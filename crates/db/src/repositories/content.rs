//! Content repository (articles and news lookups for feed resolution).

use std::sync::Arc;

use crate::entities::{Article, News, article, news};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Content repository over the article and news tables.
#[derive(Clone)]
pub struct ContentRepository {
    db: Arc<DatabaseConnection>,
}

impl ContentRepository {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an article by ID.
    pub async fn find_article(&self, id: &str) -> AppResult<Option<article::Model>> {
        Article::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a news item by ID.
    pub async fn find_news(&self, id: &str) -> AppResult<Option<news::Model>> {
        News::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest published articles, newest first.
    pub async fn latest_articles(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<article::Model>> {
        Article::find()
            .filter(article::Column::PublishedAt.is_not_null())
            .order_by_desc(article::Column::PublishedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest published news items, newest first.
    pub async fn latest_news(&self, limit: u64, offset: u64) -> AppResult<Vec<news::Model>> {
        News::find()
            .filter(news::Column::PublishedAt.is_not_null())
            .order_by_desc(news::Column::PublishedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
