//! Comment entity (threaded comments on content).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::target::TargetKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The comment author
    pub user_id: String,

    /// Kind of the commented-on entity
    pub target_type: TargetKind,

    /// Entity identifier within that kind
    pub target_id: String,

    /// Comment body
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Parent comment for replies; NULL means top-level.
    /// A reply's parent always carries the same target as the reply itself.
    #[sea_orm(nullable)]
    pub parent_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
