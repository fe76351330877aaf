//! Gorse recommendation engine client.
//!
//! Thin HTTP façade over the external recommender. Every call is wrapped:
//! transport failures and non-2xx responses are logged and surfaced as
//! `None`, never as an error, so a recommender outage degrades the feed
//! instead of failing requests. Requests carry a bounded timeout.

use folio_common::{AppError, AppResult, config::GorseConfig};
use folio_db::entities::target::Target;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

/// One feedback event forwarded to the recommender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feedback {
    /// Feedback type (`read`, `like`, `save`).
    pub feedback_type: String,
    /// Acting user.
    pub user_id: String,
    /// Composite item ID (`"{type}:{id}"`).
    pub item_id: String,
    /// RFC 3339 event time.
    pub timestamp: String,
}

impl Feedback {
    /// Build a feedback event stamped with the current time.
    #[must_use]
    pub fn now(feedback_type: &str, user_id: &str, target: &Target) -> Self {
        Self {
            feedback_type: feedback_type.to_string(),
            user_id: user_id.to_string(),
            item_id: target.composite_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One catalog item in the recommender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GorseItem {
    /// Composite item ID (`"{type}:{id}"`).
    pub item_id: String,
    /// Whether the item is excluded from recommendations.
    pub is_hidden: bool,
    /// Categories the item belongs to.
    pub categories: Vec<String>,
    /// RFC 3339 publication time.
    pub timestamp: String,
    /// Free-form labels (tags).
    pub labels: Vec<String>,
    /// Human-readable note.
    pub comment: String,
}

/// One user record in the recommender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GorseUser {
    /// User ID.
    pub user_id: String,
    /// Interest labels.
    pub labels: Vec<String>,
}

/// A scored item returned by non-personalized listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScoredItem {
    id: String,
    #[allow(dead_code)]
    score: f64,
}

/// Gorse HTTP API client.
#[derive(Clone)]
pub struct GorseClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    enabled: bool,
}

impl GorseClient {
    /// Create a new client from configuration.
    pub fn new(config: &GorseConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            enabled: config.enabled,
        })
    }

    /// Forward feedback events. Best-effort.
    pub async fn insert_feedback(&self, feedback: &[Feedback]) -> Option<()> {
        let request = self
            .request(reqwest::Method::POST, "/api/feedback")?
            .json(feedback);
        self.send::<serde_json::Value>(request, "/api/feedback")
            .await
            .map(|_| ())
    }

    /// Remove feedback of one type between a user and an item.
    pub async fn delete_feedback(
        &self,
        feedback_type: &str,
        user_id: &str,
        target: &Target,
    ) -> Option<()> {
        let path = format!(
            "/api/feedback/{feedback_type}/{user_id}/{}",
            target.composite_id()
        );
        let request = self.request(reqwest::Method::DELETE, &path)?;
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Personalized recommendations for a user.
    ///
    /// With a category filter the category-scoped endpoint is used; the
    /// plain per-user endpoint otherwise.
    pub async fn recommend(
        &self,
        user_id: &str,
        category: Option<&str>,
        n: u64,
        offset: u64,
    ) -> Option<Vec<String>> {
        let path = match category {
            Some(category) => format!("/api/recommend/{user_id}/{category}"),
            None => format!("/api/recommend/{user_id}"),
        };

        let request = self
            .request(reqwest::Method::GET, &path)?
            .query(&[("n", n.to_string()), ("offset", offset.to_string())]);
        self.send(request, &path).await
    }

    /// Non-personalized listing (`latest`, `popular`, ...).
    pub async fn non_personalized(
        &self,
        name: &str,
        category: Option<&str>,
        n: u64,
        offset: u64,
    ) -> Option<Vec<String>> {
        let path = match category {
            Some(category) => format!("/api/non-personalized/{name}/{category}"),
            None => format!("/api/non-personalized/{name}"),
        };

        let request = self
            .request(reqwest::Method::GET, &path)?
            .query(&[("n", n.to_string()), ("offset", offset.to_string())]);
        let items: Vec<ScoredItem> = self.send(request, &path).await?;
        Some(items.into_iter().map(|item| item.id).collect())
    }

    /// Insert an item into the catalog.
    pub async fn insert_item(&self, item: &GorseItem) -> Option<()> {
        let request = self.request(reqwest::Method::POST, "/api/item")?.json(item);
        self.send::<serde_json::Value>(request, "/api/item")
            .await
            .map(|_| ())
    }

    /// Update an existing catalog item.
    pub async fn update_item(&self, item: &GorseItem) -> Option<()> {
        let path = format!("/api/item/{}", item.item_id);
        let request = self.request(reqwest::Method::PATCH, &path)?.json(item);
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Fetch a catalog item.
    pub async fn get_item(&self, item_id: &str) -> Option<GorseItem> {
        let path = format!("/api/item/{item_id}");
        let request = self.request(reqwest::Method::GET, &path)?;
        self.send(request, &path).await
    }

    /// Remove an item from the catalog.
    pub async fn delete_item(&self, item_id: &str) -> Option<()> {
        let path = format!("/api/item/{item_id}");
        let request = self.request(reqwest::Method::DELETE, &path)?;
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Add an item to a category.
    pub async fn add_item_category(&self, item_id: &str, category: &str) -> Option<()> {
        let path = format!("/api/item/{item_id}/category/{category}");
        let request = self.request(reqwest::Method::PUT, &path)?;
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Remove an item from a category.
    pub async fn delete_item_category(&self, item_id: &str, category: &str) -> Option<()> {
        let path = format!("/api/item/{item_id}/category/{category}");
        let request = self.request(reqwest::Method::DELETE, &path)?;
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Register or overwrite a user.
    pub async fn insert_user(&self, user: &GorseUser) -> Option<()> {
        let request = self.request(reqwest::Method::POST, "/api/user")?.json(user);
        self.send::<serde_json::Value>(request, "/api/user")
            .await
            .map(|_| ())
    }

    /// Update an existing user record.
    pub async fn update_user(&self, user: &GorseUser) -> Option<()> {
        let path = format!("/api/user/{}", user.user_id);
        let request = self.request(reqwest::Method::PATCH, &path)?.json(user);
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Fetch a user record.
    pub async fn get_user(&self, user_id: &str) -> Option<GorseUser> {
        let path = format!("/api/user/{user_id}");
        let request = self.request(reqwest::Method::GET, &path)?;
        self.send(request, &path).await
    }

    /// Remove a user and their feedback.
    pub async fn delete_user(&self, user_id: &str) -> Option<()> {
        let path = format!("/api/user/{user_id}");
        let request = self.request(reqwest::Method::DELETE, &path)?;
        self.send::<serde_json::Value>(request, &path).await.map(|_| ())
    }

    /// Build a request, or `None` when the integration is disabled.
    fn request(&self, method: reqwest::Method, path: &str) -> Option<reqwest::RequestBuilder> {
        if !self.enabled {
            debug!(path = %path, "Recommender integration disabled, skipping call");
            return None;
        }

        let url = format!("{}{path}", self.base_url);
        let mut request = self.http_client.request(method, url);
        if let Some(ref api_key) = self.api_key {
            request = request.header("X-API-Key", api_key);
        }
        Some(request)
    }

    /// Send a request, absorbing every failure into `None`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Option<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, path = %path, "Recommender request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                body = %body,
                path = %path,
                "Recommender returned an error response"
            );
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, path = %path, "Failed to parse recommender response");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use folio_db::entities::target::TargetKind;

    fn test_config(enabled: bool) -> GorseConfig {
        GorseConfig {
            enabled,
            url: "http://localhost:8087/".to_string(),
            api_key: None,
            timeout_secs: 3,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GorseClient::new(&test_config(true)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8087");
    }

    #[tokio::test]
    async fn test_disabled_client_returns_none_without_network() {
        let client = GorseClient::new(&test_config(false)).unwrap();
        let target = Target::new(TargetKind::Article, "42");

        assert!(client.recommend("user1", None, 10, 0).await.is_none());
        assert!(
            client
                .insert_feedback(&[Feedback::now("like", "user1", &target)])
                .await
                .is_none()
        );
    }

    #[test]
    fn test_feedback_wire_format() {
        let target = Target::new(TargetKind::Article, "42");
        let feedback = Feedback::now("like", "user1", &target);
        let value = serde_json::to_value(&feedback).unwrap();

        assert_eq!(value["FeedbackType"], "like");
        assert_eq!(value["UserId"], "user1");
        assert_eq!(value["ItemId"], "article:42");
        assert!(value["Timestamp"].is_string());
    }

    #[test]
    fn test_scored_item_wire_format() {
        let items: Vec<ScoredItem> =
            serde_json::from_str(r#"[{"Id": "article:42", "Score": 1.5}]"#).unwrap();
        assert_eq!(items[0].id, "article:42");
    }
}
