//! Comment service.
//!
//! Threaded comments over polymorphic targets. Listing pages are cached
//! indefinitely and kept fresh purely by prefix invalidation on writes;
//! a failed invalidation is logged and absorbed so a comment post never
//! fails because the cache side-channel is down.

use folio_common::{AppError, AppResult, CounterBackend, CounterStore, IdGenerator, keys};
use folio_db::{
    entities::{comment, target::Target},
    repositories::CommentRepository,
};
use sea_orm::Set;
use tracing::warn;

/// Counter-store metric for top-level comment counts.
const COMMENTS_METRIC: &str = "comments";
/// Counter-store metric for reply counts under a parent comment.
const REPLIES_METRIC: &str = "replies";
/// Counter-store flag for per-user "has commented" membership.
const COMMENTED_FLAG: &str = "commented";
/// Cache-key segment for the parent side of reply threads.
const PARENT_SEGMENT: &str = "comment";

/// Longest accepted comment body.
const MAX_CONTENT_LEN: usize = 8192;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    counters: CounterStore,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(comment_repo: CommentRepository, counters: CounterStore) -> Self {
        Self {
            comment_repo,
            counters,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a comment on a target, optionally as a reply.
    ///
    /// A reply's parent must exist and belong to the same target; a parent
    /// on a different target fails with not-found before anything is
    /// written.
    pub async fn create(
        &self,
        target: &Target,
        user_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> AppResult<comment::Model> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
        }
        if content.len() > MAX_CONTENT_LEN {
            return Err(AppError::BadRequest("Comment is too long".to_string()));
        }

        if let Some(parent_id) = parent_id {
            let parent = self
                .comment_repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::CommentNotFound(parent_id.to_string()))?;

            // Replies cannot be reparented across targets.
            if parent.target_type != target.kind || parent.target_id != target.id {
                return Err(AppError::CommentNotFound(parent_id.to_string()));
            }
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            target_type: Set(target.kind),
            target_id: Set(target.id.clone()),
            content: Set(content.to_string()),
            parent_id: Set(parent_id.map(String::from)),
            created_at: Set(chrono::Utc::now().into()),
        };
        let created = self.comment_repo.create(model).await?;

        if let Some(parent_id) = parent_id {
            self.counters
                .increment(&keys::count(PARENT_SEGMENT, parent_id, REPLIES_METRIC))
                .await?;
            self.invalidate_pages(&keys::page_prefix(PARENT_SEGMENT, parent_id, REPLIES_METRIC))
                .await;
        }

        self.counters
            .increment(&keys::count(
                target.kind.as_str(),
                &target.id,
                COMMENTS_METRIC,
            ))
            .await?;
        self.counters
            .set_flag(
                &keys::flag(target.kind.as_str(), &target.id, COMMENTED_FLAG, user_id),
                true,
            )
            .await?;
        self.invalidate_pages(&keys::page_prefix(
            target.kind.as_str(),
            &target.id,
            COMMENTS_METRIC,
        ))
        .await;

        Ok(created)
    }

    /// Remove a comment (unpost or moderation), returning whether a row
    /// was deleted.
    pub async fn delete(&self, comment_id: &str) -> AppResult<bool> {
        let Some(existing) = self.comment_repo.find_by_id(comment_id).await? else {
            return Ok(false);
        };

        let removed = self.comment_repo.delete_by_id(comment_id).await?;
        if removed == 0 {
            return Ok(false);
        }

        let target_kind = existing.target_type.as_str();

        if let Some(ref parent_id) = existing.parent_id {
            self.counters
                .decrement(&keys::count(PARENT_SEGMENT, parent_id, REPLIES_METRIC))
                .await?;
            self.invalidate_pages(&keys::page_prefix(PARENT_SEGMENT, parent_id, REPLIES_METRIC))
                .await;
        }

        self.counters
            .decrement(&keys::count(
                target_kind,
                &existing.target_id,
                COMMENTS_METRIC,
            ))
            .await?;

        // The author may have other comments here; drop the flag so the
        // next check re-derives it from the ledger.
        self.counters
            .forget(&keys::flag(
                target_kind,
                &existing.target_id,
                COMMENTED_FLAG,
                &existing.user_id,
            ))
            .await?;
        self.invalidate_pages(&keys::page_prefix(
            target_kind,
            &existing.target_id,
            COMMENTS_METRIC,
        ))
        .await;

        Ok(true)
    }

    /// One page of top-level comments, newest first (cache-aside).
    pub async fn get_comments(
        &self,
        target: &Target,
        page: u64,
        per_page: u64,
    ) -> AppResult<Vec<comment::Model>> {
        let key = keys::page(
            target.kind.as_str(),
            &target.id,
            COMMENTS_METRIC,
            page,
            per_page,
        );

        if let Some(cached) = self.counters.get_json(&key).await? {
            return serde_json::from_value(cached).map_err(|e| AppError::Cache(e.to_string()));
        }

        let comments = self.comment_repo.find_page(target, page, per_page).await?;
        let payload =
            serde_json::to_value(&comments).map_err(|e| AppError::Cache(e.to_string()))?;
        self.counters.set_json(&key, &payload).await?;
        Ok(comments)
    }

    /// One page of replies under a parent comment (cache-aside).
    pub async fn get_replies(
        &self,
        parent_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<Vec<comment::Model>> {
        let key = keys::page(PARENT_SEGMENT, parent_id, REPLIES_METRIC, page, per_page);

        if let Some(cached) = self.counters.get_json(&key).await? {
            return serde_json::from_value(cached).map_err(|e| AppError::Cache(e.to_string()));
        }

        let replies = self
            .comment_repo
            .find_replies_page(parent_id, page, per_page)
            .await?;
        let payload =
            serde_json::to_value(&replies).map_err(|e| AppError::Cache(e.to_string()))?;
        self.counters.set_json(&key, &payload).await?;
        Ok(replies)
    }

    /// Count all comments on a target, replies included (cache-aside, no
    /// expiry).
    pub async fn comments_count(&self, target: &Target) -> AppResult<i64> {
        let key = keys::count(target.kind.as_str(), &target.id, COMMENTS_METRIC);

        if let Some(cached) = self.counters.get(&key).await? {
            return Ok(cached);
        }

        let value = self.comment_repo.count_by_target(target).await? as i64;
        self.counters.set(&key, value).await?;
        Ok(value)
    }

    /// Count replies under a parent comment (cache-aside, no expiry).
    pub async fn replies_count(&self, parent_id: &str) -> AppResult<i64> {
        let key = keys::count(PARENT_SEGMENT, parent_id, REPLIES_METRIC);

        if let Some(cached) = self.counters.get(&key).await? {
            return Ok(cached);
        }

        let value = self.comment_repo.count_replies(parent_id).await? as i64;
        self.counters.set(&key, value).await?;
        Ok(value)
    }

    /// Check whether a user has commented on a target (cache-aside).
    pub async fn has_commented(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        let key = keys::flag(target.kind.as_str(), &target.id, COMMENTED_FLAG, user_id);

        if let Some(cached) = self.counters.get_flag(&key).await? {
            return Ok(cached);
        }

        let value = self.comment_repo.has_commented(user_id, target).await?;
        self.counters.set_flag(&key, value).await?;
        Ok(value)
    }

    /// Best-effort pattern delete of cached listing pages.
    ///
    /// Availability over consistency: a failure here leaves stale pages
    /// until they are separately evicted, which beats failing the write.
    async fn invalidate_pages(&self, prefix: &str) {
        if let Err(e) = self.counters.forget_by_prefix(prefix).await {
            warn!(error = %e, prefix = %prefix, "Failed to invalidate cached listing pages");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::{MemoryCounterStore, NoScanCounterStore};
    use folio_db::entities::target::TargetKind;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_comment(
        id: &str,
        user_id: &str,
        target_id: &str,
        parent_id: Option<&str>,
    ) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type: TargetKind::Article,
            target_id: target_id.to_string(),
            content: "Test comment".to_string(),
            parent_id: parent_id.map(String::from),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> CommentService {
        let repo = CommentRepository::new(Arc::new(db));
        CommentService::new(repo, Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_create_empty_content_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        let result = service.create(&target, "user1", "   ", None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_reply_missing_parent_fails_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        let result = service
            .create(&target, "user1", "A reply", Some("missing"))
            .await;
        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_reply_to_parent_on_other_target_fails_not_found() {
        // Parent belongs to article 9, the reply targets article 7.
        let parent = create_test_comment("c1", "user1", "9", None);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[parent]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "7");

        let result = service
            .create(&target, "user2", "A reply", Some("c1"))
            .await;
        assert!(matches!(result, Err(AppError::CommentNotFound(_))));

        // Nothing was written: counters never left zero.
        assert_eq!(service.counters.get("article:7:comments").await.unwrap(), None);
        assert_eq!(
            service.counters.get("comment:c1:replies").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_create_updates_counter_flag_and_invalidates_pages() {
        let pre_insert = create_test_comment("c1", "user1", "42", None);
        let created = create_test_comment("c2", "user2", "42", None);
        let refreshed_page = vec![
            create_test_comment("c2", "user2", "42", None),
            create_test_comment("c1", "user1", "42", None),
        ];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // first page fill
            .append_query_results([vec![pre_insert]])
            // insert
            .append_query_results([[created]])
            // page re-fill after invalidation
            .append_query_results([refreshed_page])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        // Prime the page cache.
        let page = service.get_comments(&target, 1, 10).await.unwrap();
        assert_eq!(page.len(), 1);

        service
            .create(&target, "user2", "A new comment", None)
            .await
            .unwrap();

        // The cached page was pattern-deleted; this read reflects the
        // new comment.
        let page = service.get_comments(&target, 1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "c2");

        assert!(service.has_commented(&target, "user2").await.unwrap());
        assert_eq!(service.counters.get("article:42:comments").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_reply_bumps_parent_reply_counter() {
        let parent = create_test_comment("c1", "user1", "42", None);
        let reply = create_test_comment("c2", "user2", "42", Some("c1"));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[parent]])
            .append_query_results([[reply]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        service
            .create(&target, "user2", "A reply", Some("c1"))
            .await
            .unwrap();

        assert_eq!(service.replies_count("c1").await.unwrap(), 1);
        assert_eq!(service.comments_count(&target).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_survives_unavailable_pattern_delete() {
        let created = create_test_comment("c1", "user1", "42", None);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[created]])
            .into_connection();

        let repo = CommentRepository::new(Arc::new(db));
        let counters: CounterStore =
            Arc::new(NoScanCounterStore::new(MemoryCounterStore::new()));
        let service = CommentService::new(repo, counters);

        let target = Target::new(TargetKind::Article, "42");
        // The invalidation side-channel rejects pattern deletes; the post
        // still succeeds and the counter still moved.
        let result = service.create(&target, "user1", "Hello", None).await;
        assert!(result.is_ok());
        assert_eq!(service.comments_count(&target).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_comments_cache_stability() {
        let page = vec![create_test_comment("c1", "user1", "42", None)];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([page])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        // Second read must come from cache; the mock only has one page.
        let first = service.get_comments(&target, 1, 10).await.unwrap();
        let second = service.get_comments(&target, 1, 10).await.unwrap();
        assert_eq!(first, second);
    }
}
