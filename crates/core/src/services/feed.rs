//! Feed assembly service.
//!
//! Translates application feed requests into recommender calls and
//! resolves the returned composite IDs (`"{type}:{id}"`) back into content
//! through a per-type resolver table. A recommender outage degrades to
//! non-personalized and finally to plain latest content; a failing
//! resolver drops its item instead of failing the feed.

use crate::services::gorse::GorseClient;
use folio_common::AppResult;
use folio_db::{
    entities::{article, news},
    repositories::ContentRepository,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default non-personalized listing used as the personalized fallback.
const FALLBACK_LIST: &str = "latest";

/// One resolved feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Content kind (`article`, `news`, ...).
    pub kind: String,
    /// Content identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Category name.
    pub category: String,
    /// Publication time, RFC 3339.
    pub published_at: Option<String>,
}

impl From<article::Model> for FeedItem {
    fn from(model: article::Model) -> Self {
        Self {
            kind: "article".to_string(),
            id: model.id,
            title: model.title,
            slug: model.slug,
            category: model.category,
            published_at: model.published_at.map(|at| at.to_rfc3339()),
        }
    }
}

impl From<news::Model> for FeedItem {
    fn from(model: news::Model) -> Self {
        Self {
            kind: "news".to_string(),
            id: model.id,
            title: model.title,
            slug: model.slug,
            category: model.category,
            published_at: model.published_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Feed request parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Category filter.
    #[serde(default)]
    pub category: Option<String>,
    /// Tag filter.
    #[serde(default)]
    pub tag: Option<String>,
}

impl FeedQuery {
    fn param(&self, name: &str) -> Option<&str> {
        match name {
            "category" => self.category.as_deref(),
            "tag" => self.tag.as_deref(),
            _ => None,
        }
    }
}

/// A named filter predicate: maps a raw parameter value to a recommender
/// filter string, or `None` to exclude it.
type FilterPredicate = fn(&str) -> Option<String>;

/// Registered filter predicates, applied in order.
const FILTERS: &[(&str, FilterPredicate)] = &[
    ("category", category_filter),
    ("tag", tag_filter),
];

fn category_filter(raw: &str) -> Option<String> {
    Some(raw.to_lowercase())
}

fn tag_filter(raw: &str) -> Option<String> {
    Some(format!("tag:{}", raw.to_lowercase()))
}

/// Resolver callback turning a content ID into a feed item.
///
/// `Ok(None)` means the content no longer exists and the entry is skipped.
pub type ContentResolver =
    Arc<dyn Fn(String) -> BoxFuture<'static, AppResult<Option<FeedItem>>> + Send + Sync>;

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    gorse: Arc<GorseClient>,
    content_repo: ContentRepository,
    resolvers: HashMap<&'static str, ContentResolver>,
}

impl FeedService {
    /// Create a new feed service with resolvers for the built-in content
    /// types.
    #[must_use]
    pub fn new(gorse: Arc<GorseClient>, content_repo: ContentRepository) -> Self {
        let mut service = Self {
            gorse,
            content_repo: content_repo.clone(),
            resolvers: HashMap::new(),
        };

        let article_repo = content_repo.clone();
        service.register_resolver(
            "article",
            Arc::new(move |id: String| {
                let repo = article_repo.clone();
                async move {
                    Ok(repo.find_article(&id).await?.map(FeedItem::from))
                }
                .boxed()
            }),
        );

        let news_repo = content_repo;
        service.register_resolver(
            "news",
            Arc::new(move |id: String| {
                let repo = news_repo.clone();
                async move { Ok(repo.find_news(&id).await?.map(FeedItem::from)) }.boxed()
            }),
        );

        service
    }

    /// Register a resolver for a composite-ID type prefix.
    pub fn register_resolver(&mut self, kind: &'static str, resolver: ContentResolver) {
        self.resolvers.insert(kind, resolver);
    }

    /// Apply the filter registry to a request, skipping absent, empty and
    /// `"all"` values.
    #[must_use]
    pub fn build_filters(query: &FeedQuery) -> Vec<String> {
        FILTERS
            .iter()
            .filter_map(|(name, predicate)| {
                let raw = query.param(name)?;
                let raw = raw.trim();
                if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
                    return None;
                }
                predicate(raw)
            })
            .collect()
    }

    /// Personalized feed for a user.
    ///
    /// Recommender unavailable means fallback, not failure: degrades to
    /// the non-personalized list, then to plain latest content.
    pub async fn personalized(
        &self,
        user_id: &str,
        query: &FeedQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<FeedItem>> {
        let filters = Self::build_filters(query);
        let category = filters.first().map(String::as_str);

        match self.gorse.recommend(user_id, category, limit, offset).await {
            Some(ids) => Ok(self.resolve_contents(ids).await),
            None => {
                debug!(user_id = %user_id, "No personalized recommendations, falling back");
                self.non_personalized(FALLBACK_LIST, query, limit, offset)
                    .await
            }
        }
    }

    /// Non-personalized feed (`latest`, `popular`, ...).
    pub async fn non_personalized(
        &self,
        name: &str,
        query: &FeedQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<FeedItem>> {
        let filters = Self::build_filters(query);
        let category = filters.first().map(String::as_str);

        match self
            .gorse
            .non_personalized(name, category, limit, offset)
            .await
        {
            Some(ids) => Ok(self.resolve_contents(ids).await),
            None => {
                debug!(name = %name, "Recommender unavailable, serving latest content");
                self.latest_content(limit, offset).await
            }
        }
    }

    /// Latest published content across both content tables, newest first.
    async fn latest_content(&self, limit: u64, offset: u64) -> AppResult<Vec<FeedItem>> {
        let mut items: Vec<FeedItem> = self
            .content_repo
            .latest_articles(limit, offset)
            .await?
            .into_iter()
            .map(FeedItem::from)
            .chain(
                self.content_repo
                    .latest_news(limit, offset)
                    .await?
                    .into_iter()
                    .map(FeedItem::from),
            )
            .collect();

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    /// Resolve composite IDs into content, dropping failed items.
    pub async fn resolve_contents(&self, ids: Vec<String>) -> Vec<FeedItem> {
        let mut items = Vec::with_capacity(ids.len());

        for composite in ids {
            let Some((kind, id)) = composite.split_once(':') else {
                warn!(id = %composite, "Malformed composite recommendation ID, dropping");
                continue;
            };

            let Some(resolver) = self.resolvers.get(kind) else {
                warn!(kind = %kind, id = %id, "No resolver registered for content type, dropping");
                continue;
            };

            match resolver(id.to_string()).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {
                    debug!(kind = %kind, id = %id, "Recommended content no longer exists, dropping");
                }
                Err(e) => {
                    warn!(error = %e, kind = %kind, id = %id, "Content resolution failed, dropping");
                }
            }
        }

        items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::config::GorseConfig;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_article(id: &str, title: &str) -> article::Model {
        article::Model {
            id: id.to_string(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            category: "engineering".to_string(),
            tags: json!(["rust"]),
            published_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        }
    }

    fn offline_gorse() -> Arc<GorseClient> {
        // Disabled client: every call yields None without touching the
        // network, standing in for an unreachable recommender.
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

    fn service_with(db: sea_orm::DatabaseConnection) -> FeedService {
        FeedService::new(offline_gorse(), ContentRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_build_filters_skips_absent_empty_and_all() {
        assert!(FeedService::build_filters(&FeedQuery::default()).is_empty());

        let query = FeedQuery {
            category: Some("all".to_string()),
            tag: Some("  ".to_string()),
        };
        assert!(FeedService::build_filters(&query).is_empty());

        let query = FeedQuery {
            category: Some("Engineering".to_string()),
            tag: Some("Rust".to_string()),
        };
        assert_eq!(
            FeedService::build_filters(&query),
            vec!["engineering".to_string(), "tag:rust".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_contents_drops_bad_entries() {
        let article = create_test_article("a1", "Hello World");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // resolver lookup for "article:a1"
            .append_query_results([[article]])
            // resolver lookup for the vanished "article:gone"
            .append_query_results([Vec::<article::Model>::new()])
            .into_connection();

        let service = service_with(db);

        let items = service
            .resolve_contents(vec![
                "article:a1".to_string(),
                "malformed-id".to_string(),
                "video:v1".to_string(),
                "article:gone".to_string(),
            ])
            .await;

        // Only the resolvable entry survives; malformed IDs, unknown types
        // and vanished content are dropped.
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a1");
        assert_eq!(items[0].kind, "article");
    }

    #[tokio::test]
    async fn test_personalized_falls_back_to_latest_content() {
        let article = create_test_article("a1", "Fallback Article");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[article]])
            .append_query_results([Vec::<news::Model>::new()])
            .into_connection();

        let service = service_with(db);

        // Recommender yields nothing; the feed degrades to latest content
        // instead of erroring.
        let items = service
            .personalized("user1", &FeedQuery::default(), 10, 0)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Fallback Article");
    }

    #[tokio::test]
    async fn test_resolver_error_drops_item_only() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut service = service_with(db);

        service.register_resolver(
            "course",
            Arc::new(|_id: String| {
                async move {
                    Err(folio_common::AppError::Database(
                        "course table unavailable".to_string(),
                    ))
                }
                .boxed()
            }),
        );

        let items = service
            .resolve_contents(vec!["course:c1".to_string()])
            .await;

        // Partial results over total failure.
        assert!(items.is_empty());
    }
}
