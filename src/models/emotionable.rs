//! Polymorphic reaction rows: one user, one target, one emotion.
//!
//! At most one row exists per `(user_id, target_kind, target_id)`; rows are
//! only ever written by the reaction toggle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "emotionables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub emotion_id: i32,
    pub target_kind: String,
    pub target_id: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::emotion::Entity",
        from = "Column::EmotionId",
        to = "super::emotion::Column::Id",
        on_delete = "Cascade"
    )]
    Emotion,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::emotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Emotion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Entity a reaction can point at. The stored discriminator is the table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Post,
    Comment,
    User,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Post, TargetKind::Comment, TargetKind::User];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Post => "posts",
            TargetKind::Comment => "comments",
            TargetKind::User => "users",
        }
    }

    /// Hashids connection used for IDs of this kind.
    pub fn connection(self) -> &'static str {
        match self {
            TargetKind::User => crate::config::hashids::USERS_CONNECTION,
            TargetKind::Post | TargetKind::Comment => crate::config::hashids::MAIN_CONNECTION,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTargetKind(pub String);

impl FromStr for TargetKind {
    type Err = UnknownTargetKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(TargetKind::Post),
            "comments" => Ok(TargetKind::Comment),
            "users" => Ok(TargetKind::User),
            other => Err(UnknownTargetKind(other.to_string())),
        }
    }
}
