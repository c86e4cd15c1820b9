//! Reaction types ("emotions") managed by administrators.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "emotions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique among rows that are not soft-deleted
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::emotionable::Entity")]
    Emotionables,
}

impl Related<super::emotionable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Emotionables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}
