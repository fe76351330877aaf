//! Recommender catalog synchronization.
//!
//! Keeps the recommender's item and user catalogs in step with local
//! content. All calls are best-effort: a recommender outage leaves the
//! catalog stale and is reported as `false`, never as an error.

use crate::services::gorse::{GorseClient, GorseItem, GorseUser};
use folio_common::{AppError, AppResult};
use folio_db::{
    entities::target::{Target, TargetKind},
    repositories::ContentRepository,
};
use std::sync::Arc;

/// Catalog synchronization service.
#[derive(Clone)]
pub struct CatalogService {
    gorse: Arc<GorseClient>,
    content_repo: ContentRepository,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(gorse: Arc<GorseClient>, content_repo: ContentRepository) -> Self {
        Self { gorse, content_repo }
    }

    /// Push an article into the recommender catalog.
    ///
    /// Returns whether the recommender accepted the sync. Unknown content
    /// is a hard failure; an unreachable recommender is not.
    pub async fn sync_article(&self, id: &str) -> AppResult<bool> {
        let article = self
            .content_repo
            .find_article(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article not found: {id}")))?;

        let item = GorseItem {
            item_id: Target::new(TargetKind::Article, id).composite_id(),
            is_hidden: article.published_at.is_none(),
            categories: vec![article.category.clone()],
            timestamp: article
                .published_at
                .unwrap_or(article.created_at)
                .to_rfc3339(),
            labels: labels_from_tags(&article.tags),
            comment: article.title,
        };

        Ok(self.upsert(item, &article.category).await)
    }

    /// Push a news item into the recommender catalog.
    pub async fn sync_news(&self, id: &str) -> AppResult<bool> {
        let news = self
            .content_repo
            .find_news(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("News not found: {id}")))?;

        let item = GorseItem {
            item_id: Target::new(TargetKind::News, id).composite_id(),
            is_hidden: news.published_at.is_none(),
            categories: vec![news.category.clone()],
            timestamp: news.published_at.unwrap_or(news.created_at).to_rfc3339(),
            labels: labels_from_tags(&news.tags),
            comment: news.title,
        };

        Ok(self.upsert(item, &news.category).await)
    }

    /// Remove content from the recommender catalog.
    pub async fn remove(&self, target: &Target) -> bool {
        self.gorse
            .delete_item(&target.composite_id())
            .await
            .is_some()
    }

    /// Register a user with the recommender, updating an existing record.
    pub async fn register_user(&self, user_id: &str, labels: Vec<String>) -> bool {
        let user = GorseUser {
            user_id: user_id.to_string(),
            labels,
        };

        if self.gorse.get_user(user_id).await.is_some() {
            self.gorse.update_user(&user).await.is_some()
        } else {
            self.gorse.insert_user(&user).await.is_some()
        }
    }

    /// Remove a user and their feedback from the recommender.
    pub async fn remove_user(&self, user_id: &str) -> bool {
        self.gorse.delete_user(user_id).await.is_some()
    }

    /// Insert or update an item, keeping its category assignment current.
    async fn upsert(&self, item: GorseItem, category: &str) -> bool {
        let synced = if self.gorse.get_item(&item.item_id).await.is_some() {
            let updated = self.gorse.update_item(&item).await.is_some();
            // Category changes are a separate assignment call on update.
            let assigned = self
                .gorse
                .add_item_category(&item.item_id, category)
                .await
                .is_some();
            updated && assigned
        } else {
            self.gorse.insert_item(&item).await.is_some()
        };

        synced
    }
}

fn labels_from_tags(tags: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(tags.clone()).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::config::GorseConfig;
    use folio_db::entities::article;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn offline_gorse() -> Arc<GorseClient> {
        Arc::new(
            GorseClient::new(&GorseConfig {
                enabled: false,
                url: "http://localhost:8087".to_string(),
                api_key: None,
                timeout_secs: 1,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_sync_missing_article_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<article::Model>::new()])
            .into_connection();

        let service = CatalogService::new(offline_gorse(), ContentRepository::new(Arc::new(db)));
        let result = service.sync_article("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sync_with_unreachable_recommender_reports_false() {
        let article = article::Model {
            id: "a1".to_string(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            category: "engineering".to_string(),
            tags: json!(["rust"]),
            published_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[article]])
            .into_connection();

        let service = CatalogService::new(offline_gorse(), ContentRepository::new(Arc::new(db)));

        // The content exists, so the operation succeeds; the recommender
        // just did not take the sync.
        let synced = service.sync_article("a1").await.unwrap();
        assert!(!synced);
    }

    #[test]
    fn test_labels_from_tags() {
        assert_eq!(labels_from_tags(&json!(["rust", "web"])), vec!["rust", "web"]);
        assert!(labels_from_tags(&json!({})).is_empty());
    }
}
