use crate::config::hashids::{HashidsManager, MAIN_CONNECTION, USERS_CONNECTION};
use crate::config::reaction::ReactionConfig;
use crate::error::AppResult;
use crate::handlers::emotion::EmotionResponse;
use crate::middleware::AuthUser;
use crate::models::{EmotionableModel, TargetKind};
use crate::response::ApiResponse;
use crate::services::reaction::{ReactionService, TargetRef, ToggleOutcome};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ToggleReactionRequest {
    /// Opaque emotion ID
    pub emotion_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub id: String,
    pub user_id: String,
    pub emotion_id: String,
    pub target_kind: String,
    pub target_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReactionResponse {
    fn build(row: EmotionableModel, kind: TargetKind, hashids: &HashidsManager) -> AppResult<Self> {
        Ok(Self {
            id: hashids.encode_id(MAIN_CONNECTION, row.id)?,
            user_id: hashids.encode_id(USERS_CONNECTION, row.user_id)?,
            emotion_id: hashids.encode_id(MAIN_CONNECTION, row.emotion_id)?,
            target_kind: row.target_kind,
            target_id: hashids.encode_id(kind.connection(), row.target_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleReactionResponse {
    /// "created", "removed" or "replaced"
    pub outcome: &'static str,
    /// The row as it stands after the toggle (or as it was, when removed)
    pub reaction: ReactionResponse,
}

#[derive(Debug, Serialize)]
pub struct EmotionCountResponse {
    pub emotion: EmotionResponse,
    pub count: u64,
}

/// Parse `{kind}/{id}` from the path: kind first, since it picks the
/// connection the ID is decoded with.
fn resolve_target(
    service: &ReactionService,
    hashids: &HashidsManager,
    kind: &str,
    id: &str,
) -> AppResult<TargetRef> {
    let kind = service.resolve_kind(kind)?;
    let id = hashids.decode_id(kind.connection(), id)?;
    Ok(TargetRef::new(kind, id))
}

pub async fn toggle_reaction(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Extension(config): Extension<ReactionConfig>,
    auth_user: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    Json(payload): Json<ToggleReactionRequest>,
) -> AppResult<impl IntoResponse> {
    let service = ReactionService::new(db, config);
    let target = resolve_target(&service, &hashids, &kind, &id)?;
    let emotion_id = hashids.decode_id(MAIN_CONNECTION, &payload.emotion_id)?;

    let outcome: ToggleOutcome = service
        .toggle(auth_user.user_id, target, emotion_id)
        .await?;

    let label = outcome.as_str();
    Ok(ApiResponse::ok(ToggleReactionResponse {
        outcome: label,
        reaction: ReactionResponse::build(outcome.into_row(), target.kind, &hashids)?,
    }))
}

pub async fn my_reaction(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Extension(config): Extension<ReactionConfig>,
    auth_user: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let service = ReactionService::new(db, config);
    let target = resolve_target(&service, &hashids, &kind, &id)?;

    let reaction = service
        .current(auth_user.user_id, target)
        .await?
        .map(|row| ReactionResponse::build(row, target.kind, &hashids))
        .transpose()?;
    Ok(ApiResponse::ok(reaction))
}

pub async fn reaction_summary(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Extension(config): Extension<ReactionConfig>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let service = ReactionService::new(db, config);
    let target = resolve_target(&service, &hashids, &kind, &id)?;

    let items = service
        .summary(target)
        .await?
        .into_iter()
        .map(|c| {
            Ok(EmotionCountResponse {
                emotion: EmotionResponse::build(c.emotion, &hashids)?,
                count: c.count,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(ApiResponse::ok(items))
}
