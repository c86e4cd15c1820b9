use crate::{
    config::reaction::ReactionConfig,
    models::{
        comment, emotion, emotionable, post, user, Comment, Emotion, EmotionModel, Emotionable,
        EmotionableModel, Post, TargetKind, User,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    Statement, TransactionTrait,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("unsupported target kind '{0}'")]
    UnsupportedTargetKind(String),

    #[error("reaction target not found")]
    TargetNotFound,

    #[error("emotion not found")]
    ReactionTypeNotFound,

    #[error("persistence failure: {0}")]
    Persistence(#[from] DbErr),
}

/// A polymorphic reaction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: i32,
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: i32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Result of one toggle. Every call produces exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// No reaction existed; one was inserted.
    Created(EmotionableModel),
    /// The same emotion was chosen again; the row was deleted.
    Removed(EmotionableModel),
    /// A different emotion was chosen; the row now points at it.
    Replaced(EmotionableModel),
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Created(_) => "created",
            ToggleOutcome::Removed(_) => "removed",
            ToggleOutcome::Replaced(_) => "replaced",
        }
    }

    pub fn row(&self) -> &EmotionableModel {
        match self {
            ToggleOutcome::Created(row)
            | ToggleOutcome::Removed(row)
            | ToggleOutcome::Replaced(row) => row,
        }
    }

    pub fn into_row(self) -> EmotionableModel {
        match self {
            ToggleOutcome::Created(row)
            | ToggleOutcome::Removed(row)
            | ToggleOutcome::Replaced(row) => row,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmotionCount {
    pub emotion: EmotionModel,
    pub count: u64,
}

pub struct ReactionService {
    db: DatabaseConnection,
    config: ReactionConfig,
}

impl ReactionService {
    pub fn new(db: DatabaseConnection, config: ReactionConfig) -> Self {
        Self { db, config }
    }

    /// Parse a target kind from the wire and check it against the allow-list.
    pub fn resolve_kind(&self, raw: &str) -> Result<TargetKind, ReactionError> {
        raw.parse::<TargetKind>()
            .ok()
            .filter(|kind| self.config.allows(*kind))
            .ok_or_else(|| ReactionError::UnsupportedTargetKind(raw.to_string()))
    }

    /// Create, remove or replace the caller's reaction on `target`.
    ///
    /// Runs in a single transaction; any storage error rolls the whole
    /// operation back and surfaces as `ReactionError::Persistence`.
    pub async fn toggle(
        &self,
        user_id: i32,
        target: TargetRef,
        emotion_id: i32,
    ) -> Result<ToggleOutcome, ReactionError> {
        if !self.config.allows(target.kind) {
            return Err(ReactionError::UnsupportedTargetKind(
                target.kind.to_string(),
            ));
        }

        let result = self.toggle_in_transaction(user_id, target, emotion_id).await;

        match &result {
            Ok(outcome) => tracing::debug!(
                user_id,
                target_kind = target.kind.as_str(),
                target_id = target.id,
                emotion_id,
                outcome = outcome.as_str(),
                "Reaction toggled"
            ),
            Err(ReactionError::Persistence(e)) => tracing::error!(
                user_id,
                target_kind = target.kind.as_str(),
                target_id = target.id,
                emotion_id,
                error = %e,
                "Reaction toggle rolled back"
            ),
            Err(_) => {}
        }

        result
    }

    async fn toggle_in_transaction(
        &self,
        user_id: i32,
        target: TargetRef,
        emotion_id: i32,
    ) -> Result<ToggleOutcome, ReactionError> {
        // Dropping `txn` on any early return rolls it back.
        let txn = self.db.begin().await?;

        if !target_exists(&txn, target).await? {
            return Err(ReactionError::TargetNotFound);
        }
        if !emotion_is_live(&txn, emotion_id).await? {
            return Err(ReactionError::ReactionTypeNotFound);
        }

        lock_reaction_key(&txn, user_id, target).await?;

        let mut query = reactions_on(target).filter(emotionable::Column::UserId.eq(user_id));
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        let existing = query.one(&txn).await?;

        let now = chrono::Utc::now().naive_utc();
        let outcome = match existing {
            None => {
                let row = emotionable::ActiveModel {
                    user_id: Set(user_id),
                    emotion_id: Set(emotion_id),
                    target_kind: Set(target.kind.as_str().to_string()),
                    target_id: Set(target.id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                ToggleOutcome::Created(row)
            }
            Some(row) if row.emotion_id == emotion_id => {
                row.clone().delete(&txn).await?;
                ToggleOutcome::Removed(row)
            }
            Some(row) => {
                let mut active: emotionable::ActiveModel = row.into();
                active.emotion_id = Set(emotion_id);
                active.updated_at = Set(now);
                ToggleOutcome::Replaced(active.update(&txn).await?)
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    /// The caller's current reaction on `target`, if any.
    pub async fn current(
        &self,
        user_id: i32,
        target: TargetRef,
    ) -> Result<Option<EmotionableModel>, ReactionError> {
        if !target_exists(&self.db, target).await? {
            return Err(ReactionError::TargetNotFound);
        }

        Ok(reactions_on(target)
            .filter(emotionable::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Reaction counts per live emotion on `target`, ordered by emotion name.
    pub async fn summary(&self, target: TargetRef) -> Result<Vec<EmotionCount>, ReactionError> {
        if !target_exists(&self.db, target).await? {
            return Err(ReactionError::TargetNotFound);
        }

        let counts: HashMap<i32, u64> = reactions_on(target)
            .select_only()
            .column(emotionable::Column::EmotionId)
            .column_as(emotionable::Column::Id.count(), "count")
            .group_by(emotionable::Column::EmotionId)
            .into_tuple::<(i32, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(emotion_id, count)| (emotion_id, u64::try_from(count).unwrap_or_default()))
            .collect();
        if counts.is_empty() {
            return Ok(vec![]);
        }

        let emotions = Emotion::find()
            .filter(emotion::Column::Id.is_in(counts.keys().copied().collect::<Vec<_>>()))
            .filter(emotion::Column::DeletedAt.is_null())
            .order_by_asc(emotion::Column::Name)
            .all(&self.db)
            .await?;

        Ok(emotions
            .into_iter()
            .map(|emotion| EmotionCount {
                count: counts.get(&emotion.id).copied().unwrap_or_default(),
                emotion,
            })
            .collect())
    }
}

fn reactions_on(target: TargetRef) -> Select<Emotionable> {
    Emotionable::find()
        .filter(emotionable::Column::TargetKind.eq(target.kind.as_str()))
        .filter(emotionable::Column::TargetId.eq(target.id))
}

/// Soft-deleted targets count as missing.
async fn target_exists<C: ConnectionTrait>(conn: &C, target: TargetRef) -> Result<bool, DbErr> {
    let found = match target.kind {
        TargetKind::Post => {
            Post::find_by_id(target.id)
                .filter(post::Column::DeletedAt.is_null())
                .count(conn)
                .await?
        }
        TargetKind::Comment => {
            Comment::find_by_id(target.id)
                .filter(comment::Column::DeletedAt.is_null())
                .count(conn)
                .await?
        }
        TargetKind::User => {
            User::find_by_id(target.id)
                .filter(user::Column::DeletedAt.is_null())
                .count(conn)
                .await?
        }
    };
    Ok(found > 0)
}

async fn emotion_is_live<C: ConnectionTrait>(conn: &C, emotion_id: i32) -> Result<bool, DbErr> {
    let found = Emotion::find_by_id(emotion_id)
        .filter(emotion::Column::DeletedAt.is_null())
        .count(conn)
        .await?;
    Ok(found > 0)
}

/// Serialise toggles on one `(user, target)` key for the rest of the
/// transaction. `FOR UPDATE` alone cannot cover the case where no row exists
/// yet, so Postgres takes a transaction-scoped advisory lock on the key.
async fn lock_reaction_key<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    target: TargetRef,
) -> Result<(), DbErr> {
    if conn.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }

    let key = format!("emotionable:{}:{}:{}", user_id, target.kind.as_str(), target.id);
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        vec![key.into()],
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(emotion_id: i32) -> EmotionableModel {
        let now = chrono::Utc::now().naive_utc();
        EmotionableModel {
            id: 1,
            user_id: 2,
            emotion_id,
            target_kind: "posts".to_string(),
            target_id: 5,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(ToggleOutcome::Created(row(3)).as_str(), "created");
        assert_eq!(ToggleOutcome::Removed(row(3)).as_str(), "removed");
        assert_eq!(ToggleOutcome::Replaced(row(7)).as_str(), "replaced");
    }

    #[test]
    fn outcome_exposes_row() {
        let outcome = ToggleOutcome::Replaced(row(7));
        assert_eq!(outcome.row().emotion_id, 7);
        assert_eq!(outcome.into_row().target_id, 5);
    }

    #[test]
    fn target_ref_display() {
        let target = TargetRef::new(TargetKind::Comment, 12);
        assert_eq!(target.to_string(), "comments#12");
    }
}
