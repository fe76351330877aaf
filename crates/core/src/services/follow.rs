//! Follow service.

use folio_common::{AppError, AppResult, CounterBackend, CounterStore, IdGenerator, keys};
use folio_db::{
    entities::{
        follow,
        target::{Target, TargetKind},
    },
    repositories::FollowRepository,
};
use sea_orm::Set;

/// Counter-store metric for follower counts.
const FOLLOWERS_METRIC: &str = "followers";
/// Counter-store flag for per-user follow membership.
const FOLLOWED_FLAG: &str = "followed";

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    counters: CounterStore,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository, counters: CounterStore) -> Self {
        Self {
            follow_repo,
            counters,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a target.
    ///
    /// Returns whether a new follow was recorded (false when already
    /// following).
    pub async fn follow(&self, follower_id: &str, target: &Target) -> AppResult<bool> {
        if target.kind == TargetKind::User && target.id == follower_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        if self.is_following(follower_id, target).await? {
            return Ok(false);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            target_type: Set(target.kind),
            target_id: Set(target.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.follow_repo.create(model).await?;

        self.counters.increment(&Self::count_key(target)).await?;
        self.counters
            .set_flag(&Self::flag_key(target, follower_id), true)
            .await?;

        Ok(true)
    }

    /// Unfollow a target, returning whether a follow row was removed.
    pub async fn unfollow(&self, follower_id: &str, target: &Target) -> AppResult<bool> {
        let removed = self
            .follow_repo
            .delete_by_follower_and_target(follower_id, target)
            .await?;

        if removed == 0 {
            return Ok(false);
        }

        self.counters.decrement(&Self::count_key(target)).await?;
        self.counters
            .forget(&Self::flag_key(target, follower_id))
            .await?;

        Ok(true)
    }

    /// Count followers of a target (cache-aside, no expiry).
    pub async fn followers_count(&self, target: &Target) -> AppResult<i64> {
        let key = Self::count_key(target);

        if let Some(cached) = self.counters.get(&key).await? {
            return Ok(cached);
        }

        let value = self.follow_repo.count_by_target(target).await? as i64;
        self.counters.set(&key, value).await?;
        Ok(value)
    }

    /// Check whether a user follows a target (cache-aside, no expiry).
    pub async fn is_following(&self, follower_id: &str, target: &Target) -> AppResult<bool> {
        let key = Self::flag_key(target, follower_id);

        if let Some(cached) = self.counters.get_flag(&key).await? {
            return Ok(cached);
        }

        let value = self.follow_repo.exists(follower_id, target).await?;
        self.counters.set_flag(&key, value).await?;
        Ok(value)
    }

    /// Everything a user follows, newest first.
    pub async fn following(
        &self,
        follower_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        self.follow_repo
            .find_by_follower(follower_id, limit, until_id)
            .await
    }

    fn count_key(target: &Target) -> String {
        keys::count(target.kind.as_str(), &target.id, FOLLOWERS_METRIC)
    }

    fn flag_key(target: &Target, follower_id: &str) -> String {
        keys::flag(target.kind.as_str(), &target.id, FOLLOWED_FLAG, follower_id)
    }
}
