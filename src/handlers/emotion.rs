use crate::config::hashids::{HashidsManager, MAIN_CONNECTION};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::EmotionModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::emotion::{EmotionChanges, EmotionService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct EmotionResponse {
    /// Opaque emotion ID
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<NaiveDateTime>,
}

impl EmotionResponse {
    pub fn build(emotion: EmotionModel, hashids: &HashidsManager) -> AppResult<Self> {
        Ok(Self {
            id: hashids.main()?.encode_id(emotion.id),
            name: emotion.name,
            description: emotion.description,
            avatar: emotion.avatar,
            created_at: emotion.created_at,
            updated_at: emotion.updated_at,
            deleted_at: emotion.deleted_at,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmotionRequest {
    /// Emotion name (1-50 characters)
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// Icon URL
    #[validate(url)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmotionRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(url)]
    pub avatar: Option<String>,
}

fn paginated(
    emotions: Vec<EmotionModel>,
    total: u64,
    page: u64,
    per_page: u64,
    hashids: &HashidsManager,
) -> AppResult<PaginatedResponse<EmotionResponse>> {
    let items = emotions
        .into_iter()
        .map(|e| EmotionResponse::build(e, hashids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(PaginatedResponse::new(items, total, page, per_page))
}

pub async fn list_emotions(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let service = EmotionService::new(db);
    let (emotions, total) = service.list(page, per_page).await?;
    Ok(ApiResponse::ok(paginated(
        emotions, total, page, per_page, &hashids,
    )?))
}

pub async fn get_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = hashids.decode_id(MAIN_CONNECTION, &id)?;
    let service = EmotionService::new(db);
    let emotion = service.get(id).await?;
    Ok(ApiResponse::ok(EmotionResponse::build(emotion, &hashids)?))
}

pub async fn list_trashed_emotions(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let (page, per_page) = params.resolve();
    let service = EmotionService::new(db);
    let (emotions, total) = service.list_trashed(page, per_page).await?;
    Ok(ApiResponse::ok(paginated(
        emotions, total, page, per_page, &hashids,
    )?))
}

pub async fn create_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Json(payload): Json<CreateEmotionRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = EmotionService::new(db);
    let emotion = service
        .create(&payload.name, payload.description, payload.avatar)
        .await?;
    Ok(ApiResponse::ok(EmotionResponse::build(emotion, &hashids)?))
}

pub async fn update_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmotionRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let id = hashids.decode_id(MAIN_CONNECTION, &id)?;

    let service = EmotionService::new(db);
    let emotion = service
        .update(
            id,
            EmotionChanges {
                name: payload.name,
                description: payload.description,
                avatar: payload.avatar,
            },
        )
        .await?;
    Ok(ApiResponse::ok(EmotionResponse::build(emotion, &hashids)?))
}

pub async fn delete_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let id = hashids.decode_id(MAIN_CONNECTION, &id)?;

    let service = EmotionService::new(db);
    let emotion = service.soft_delete(id).await?;
    Ok(ApiResponse::with_message(
        EmotionResponse::build(emotion, &hashids)?,
        "Emotion deleted",
    ))
}

pub async fn restore_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let id = hashids.decode_id(MAIN_CONNECTION, &id)?;

    let service = EmotionService::new(db);
    let emotion = service.restore(id).await?;
    Ok(ApiResponse::with_message(
        EmotionResponse::build(emotion, &hashids)?,
        "Emotion restored",
    ))
}

pub async fn force_delete_emotion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let id = hashids.decode_id(MAIN_CONNECTION, &id)?;

    let service = EmotionService::new(db);
    let emotion = service.force_delete(id).await?;
    Ok(ApiResponse::with_message(
        EmotionResponse::build(emotion, &hashids)?,
        "Emotion permanently deleted",
    ))
}
