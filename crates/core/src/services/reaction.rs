//! Reaction service.
//!
//! Records likes, dislikes and saves in the ledger while keeping the
//! derived counter cache in step: every mutation adjusts the aggregate
//! count and the actor's membership flag, and every read is cache-aside
//! over the ledger.

use crate::services::gorse::{Feedback, GorseClient};
use folio_common::{AppResult, CounterBackend, CounterStore, IdGenerator, keys};
use folio_db::{
    entities::{
        reaction::{self, ReactionKind},
        target::Target,
    },
    repositories::ReactionRepository,
};
use sea_orm::Set;
use std::sync::Arc;

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    counters: CounterStore,
    gorse: Option<Arc<GorseClient>>,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_repo: ReactionRepository, counters: CounterStore) -> Self {
        Self {
            reaction_repo,
            counters,
            gorse: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new reaction service that forwards feedback to the
    /// recommender.
    #[must_use]
    pub fn with_gorse(
        reaction_repo: ReactionRepository,
        counters: CounterStore,
        gorse: Arc<GorseClient>,
    ) -> Self {
        Self {
            reaction_repo,
            counters,
            gorse: Some(gorse),
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a reaction.
    ///
    /// Appends the ledger row, bumps the aggregate counter (created at 1
    /// when absent) and marks the actor's membership flag. Uniqueness is
    /// the caller's concern; the composite operations below check first,
    /// and the ledger's unique index backstops a racing duplicate.
    pub async fn insert(
        &self,
        kind: ReactionKind,
        target: &Target,
        user_id: &str,
    ) -> AppResult<reaction::Model> {
        let model = reaction::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            target_type: Set(target.kind),
            target_id: Set(target.id.clone()),
            kind: Set(kind),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.reaction_repo.create(model).await?;

        self.counters
            .increment(&self.count_key(kind, target))
            .await?;
        self.counters
            .set_flag(&self.flag_key(kind, target, user_id), true)
            .await?;

        // Forward feedback to the recommender for content targets
        if let Some(ref gorse) = self.gorse
            && let Some(feedback_type) = Self::feedback_type(kind)
        {
            gorse
                .insert_feedback(&[Feedback::now(feedback_type, user_id, target)])
                .await;
        }

        Ok(created)
    }

    /// Remove a reaction, returning whether a ledger row was deleted.
    ///
    /// Only an actual deletion adjusts the cache: the counter is
    /// decremented and the membership flag dropped (not set false), so the
    /// next check re-derives from the ledger.
    pub async fn delete(
        &self,
        kind: ReactionKind,
        target: &Target,
        user_id: &str,
    ) -> AppResult<bool> {
        let removed = self
            .reaction_repo
            .delete_by_user_and_target(user_id, target, kind)
            .await?;

        if removed == 0 {
            return Ok(false);
        }

        self.counters
            .decrement(&self.count_key(kind, target))
            .await?;
        self.counters
            .forget(&self.flag_key(kind, target, user_id))
            .await?;

        if let Some(ref gorse) = self.gorse
            && let Some(feedback_type) = Self::feedback_type(kind)
        {
            gorse.delete_feedback(feedback_type, user_id, target).await;
        }

        Ok(true)
    }

    /// Count reactions of one kind on a target (cache-aside, no expiry).
    pub async fn count(&self, kind: ReactionKind, target: &Target) -> AppResult<i64> {
        let key = self.count_key(kind, target);

        if let Some(cached) = self.counters.get(&key).await? {
            return Ok(cached);
        }

        let value = self.reaction_repo.count_by_target(target, kind).await? as i64;
        self.counters.set(&key, value).await?;
        Ok(value)
    }

    /// Check whether a user has reacted (cache-aside, no expiry).
    ///
    /// Both outcomes are cached, so every mutating path must touch the
    /// flag key or a stale false would never self-correct.
    pub async fn check(
        &self,
        kind: ReactionKind,
        target: &Target,
        user_id: &str,
    ) -> AppResult<bool> {
        let key = self.flag_key(kind, target, user_id);

        if let Some(cached) = self.counters.get_flag(&key).await? {
            return Ok(cached);
        }

        let value = self.reaction_repo.exists(user_id, target, kind).await?;
        self.counters.set_flag(&key, value).await?;
        Ok(value)
    }

    /// Like a target, retracting an existing dislike first.
    ///
    /// Returns whether a new like was recorded.
    pub async fn like(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        if self.check(ReactionKind::Dislike, target, user_id).await? {
            self.delete(ReactionKind::Dislike, target, user_id).await?;
        }

        if self.check(ReactionKind::Like, target, user_id).await? {
            return Ok(false);
        }

        self.insert(ReactionKind::Like, target, user_id).await?;
        Ok(true)
    }

    /// Dislike a target, retracting an existing like first.
    pub async fn dislike(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        if self.check(ReactionKind::Like, target, user_id).await? {
            self.delete(ReactionKind::Like, target, user_id).await?;
        }

        if self.check(ReactionKind::Dislike, target, user_id).await? {
            return Ok(false);
        }

        self.insert(ReactionKind::Dislike, target, user_id).await?;
        Ok(true)
    }

    /// Save (bookmark) a target.
    pub async fn save(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        if self.check(ReactionKind::Save, target, user_id).await? {
            return Ok(false);
        }

        self.insert(ReactionKind::Save, target, user_id).await?;
        Ok(true)
    }

    /// Remove a like.
    pub async fn unlike(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        self.delete(ReactionKind::Like, target, user_id).await
    }

    /// Remove a dislike.
    pub async fn undislike(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        self.delete(ReactionKind::Dislike, target, user_id).await
    }

    /// Remove a save.
    pub async fn unsave(&self, target: &Target, user_id: &str) -> AppResult<bool> {
        self.delete(ReactionKind::Save, target, user_id).await
    }

    /// A user's saved content, newest first.
    pub async fn saved_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<reaction::Model>> {
        self.reaction_repo
            .find_by_user(user_id, ReactionKind::Save, limit, until_id)
            .await
    }

    fn count_key(&self, kind: ReactionKind, target: &Target) -> String {
        keys::count(target.kind.as_str(), &target.id, kind.count_metric())
    }

    fn flag_key(&self, kind: ReactionKind, target: &Target, user_id: &str) -> String {
        keys::flag(
            target.kind.as_str(),
            &target.id,
            kind.membership_flag(),
            user_id,
        )
    }

    /// Recommender feedback type for a reaction kind; dislikes stay local.
    const fn feedback_type(kind: ReactionKind) -> Option<&'static str> {
        match kind {
            ReactionKind::Like => Some("like"),
            ReactionKind::Save => Some("save"),
            ReactionKind::Dislike => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::MemoryCounterStore;
    use folio_db::entities::target::TargetKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        target_id: &str,
        kind: ReactionKind,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type: TargetKind::Article,
            target_id: target_id.to_string(),
            kind,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> ReactionService {
        let repo = ReactionRepository::new(Arc::new(db));
        ReactionService::new(repo, Arc::new(MemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_insert_creates_counter_at_one_and_sets_flag() {
        let row = create_test_reaction("r1", "user1", "42", ReactionKind::Like);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        service
            .insert(ReactionKind::Like, &target, "user1")
            .await
            .unwrap();

        // Counter created at 1 on an absent key, flag cached true.
        assert_eq!(service.count(ReactionKind::Like, &target).await.unwrap(), 1);
        assert!(
            service
                .check(ReactionKind::Like, &target, "user1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_count_cache_aside_fill_and_stability() {
        // Single COUNT(*) result in the mock: a second service call must be
        // served from cache or the mock would return nothing.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_count_row(3)]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        let first = service.count(ReactionKind::Like, &target).await.unwrap();
        let second = service.count(ReactionKind::Like, &target).await.unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }

    #[tokio::test]
    async fn test_check_caches_false_result() {
        // One existence query in the mock; the repeated check must hit the
        // cached false.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reaction::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        assert!(
            !service
                .check(ReactionKind::Save, &target, "user1")
                .await
                .unwrap()
        );
        assert!(
            !service
                .check(ReactionKind::Save, &target, "user1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_without_row_leaves_cache_untouched() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([[mock_count_row(0)]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        let removed = service
            .delete(ReactionKind::Like, &target, "user1")
            .await
            .unwrap();

        assert!(!removed);
        // No decrement happened; the count re-derives 0 from the ledger.
        assert_eq!(service.count(ReactionKind::Like, &target).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_false_after_delete() {
        let insert_row = create_test_reaction("r1", "user1", "42", ReactionKind::Like);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[insert_row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            // Existence re-derivation after the flag was dropped
            .append_query_results([Vec::<reaction::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        service
            .insert(ReactionKind::Like, &target, "user1")
            .await
            .unwrap();
        assert!(
            service
                .check(ReactionKind::Like, &target, "user1")
                .await
                .unwrap()
        );

        assert!(
            service
                .delete(ReactionKind::Like, &target, "user1")
                .await
                .unwrap()
        );
        // Flag was forgotten, not set false: this check falls through to the
        // ledger and re-caches false.
        assert!(
            !service
                .check(ReactionKind::Like, &target, "user1")
                .await
                .unwrap()
        );
        assert_eq!(service.count(ReactionKind::Like, &target).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_like_dislike_exclusion_scenario() {
        // user A likes -> A dislikes (like retracted) -> user B likes.
        let like_a = create_test_reaction("r1", "userA", "42", ReactionKind::Like);
        let dislike_a = create_test_reaction("r2", "userA", "42", ReactionKind::Dislike);
        let like_b = create_test_reaction("r3", "userB", "42", ReactionKind::Like);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // like(A): dislike check miss, like check miss, insert
            .append_query_results([Vec::<reaction::Model>::new()])
            .append_query_results([Vec::<reaction::Model>::new()])
            .append_query_results([[like_a]])
            // dislike(A): like flag is cached true -> delete exec below,
            // dislike flag cached false -> insert
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[dislike_a]])
            // like(B): dislike check miss, like check miss, insert
            .append_query_results([Vec::<reaction::Model>::new()])
            .append_query_results([Vec::<reaction::Model>::new()])
            .append_query_results([[like_b]])
            // final check(Like, userA): the flag was dropped on delete, so
            // it re-derives from the ledger
            .append_query_results([Vec::<reaction::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        assert!(service.like(&target, "userA").await.unwrap());
        assert!(service.dislike(&target, "userA").await.unwrap());
        assert!(service.like(&target, "userB").await.unwrap());

        assert_eq!(service.count(ReactionKind::Like, &target).await.unwrap(), 1);
        assert_eq!(
            service.count(ReactionKind::Dislike, &target).await.unwrap(),
            1
        );
        assert!(
            !service
                .check(ReactionKind::Like, &target, "userA")
                .await
                .unwrap()
        );
        assert!(
            service
                .check(ReactionKind::Dislike, &target, "userA")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let row = create_test_reaction("r1", "user1", "42", ReactionKind::Save);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reaction::Model>::new()])
            .append_query_results([[row]])
            .into_connection();

        let service = service_with(db);
        let target = Target::new(TargetKind::Article, "42");

        assert!(service.save(&target, "user1").await.unwrap());
        // Second save sees the cached flag and records nothing.
        assert!(!service.save(&target, "user1").await.unwrap());
        assert_eq!(service.count(ReactionKind::Save, &target).await.unwrap(), 1);
    }

    /// Build a mock COUNT(*) row the way sea-orm's paginator reads it.
    fn mock_count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }
}
