//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow, target::Target};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Follow repository for ledger operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a follow row to the ledger.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a follower's follow of a target, returning rows removed.
    pub async fn delete_by_follower_and_target(
        &self,
        follower_id: &str,
        target: &Target,
    ) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::TargetType.eq(target.kind))
            .filter(follow::Column::TargetId.eq(target.id.as_str()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Check whether a follower follows a target.
    pub async fn exists(&self, follower_id: &str, target: &Target) -> AppResult<bool> {
        Ok(Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::TargetType.eq(target.kind))
            .filter(follow::Column::TargetId.eq(target.id.as_str()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// Count followers of a target.
    pub async fn count_by_target(&self, target: &Target) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::TargetType.eq(target.kind))
            .filter(follow::Column::TargetId.eq(target.id.as_str()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get everything a user follows, newest first (keyset-paginated).
    pub async fn find_by_follower(
        &self,
        follower_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<follow::Model>> {
        let mut query = Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .order_by_desc(follow::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(follow::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
