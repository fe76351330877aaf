//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment, target::Target};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Comment repository for ledger operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a comment row to the ledger.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment by ID, returning rows removed.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(comment::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count all comments on a target, replies included.
    pub async fn count_by_target(&self, target: &Target) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::TargetType.eq(target.kind))
            .filter(comment::Column::TargetId.eq(target.id.as_str()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count replies under a parent comment.
    pub async fn count_replies(&self, parent_id: &str) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a user has commented on a target.
    pub async fn has_commented(&self, user_id: &str, target: &Target) -> AppResult<bool> {
        Ok(Comment::find()
            .filter(comment::Column::UserId.eq(user_id))
            .filter(comment::Column::TargetType.eq(target.kind))
            .filter(comment::Column::TargetId.eq(target.id.as_str()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some())
    }

    /// One page of top-level comments on a target, newest first.
    ///
    /// `page` is 1-based to match the cache key scheme.
    pub async fn find_page(
        &self,
        target: &Target,
        page: u64,
        per_page: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::TargetType.eq(target.kind))
            .filter(comment::Column::TargetId.eq(target.id.as_str()))
            .filter(comment::Column::ParentId.is_null())
            .order_by_desc(comment::Column::Id)
            .paginate(self.db.as_ref(), per_page)
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of replies under a parent comment, oldest first.
    ///
    /// Replies read top-down in a thread, unlike top-level listings.
    pub async fn find_replies_page(
        &self,
        parent_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .order_by_asc(comment::Column::Id)
            .paginate(self.db.as_ref(), per_page)
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
