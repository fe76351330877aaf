//! Follow entity (a user following another entity).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::target::TargetKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The follower
    pub follower_id: String,

    /// Kind of the followed entity (user, course, ...)
    pub target_type: TargetKind,

    /// Entity identifier within that kind
    pub target_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
