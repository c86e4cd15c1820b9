use crate::config::hashids::HashidsManager;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use axum::{response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// Opaque user ID
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl UserResponse {
    fn build(user: UserModel, hashids: &HashidsManager) -> AppResult<Self> {
        Ok(Self {
            id: hashids.users()?.encode_id(user.id),
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        })
    }
}

pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    let (user, token) = service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok(ApiResponse::with_message(
        AuthResponse {
            token,
            user_id: hashids.users()?.encode_id(user.id),
            username: user.username,
        },
        "Registration successful.",
    ))
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, token) = service.login(&payload.username, &payload.password).await?;

    Ok(ApiResponse::ok(AuthResponse {
        token,
        user_id: hashids.users()?.encode_id(user.id),
        username: user.username,
    }))
}

pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hashids): Extension<HashidsManager>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let user = service.get_active_user(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::build(user, &hashids)?))
}
