use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::session::Session;
use crate::models::{User, UserUpdate};
use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Profile fields a user may change about themselves
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub company: Option<String>,
    #[validate(length(max = 2048, message = "Avatar URL is too long"))]
    pub avatar: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Session user profile", body = User),
        (status = 401, description = "Unknown session user")
    ),
    params(
        ("x-user-id" = Option<String>, Header, description = "Session user, defaults to the demo user")
    ),
    tag = "users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<User>, AppError> {
    let user = state
        .storage
        .get_user(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = User),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unknown session user")
    ),
    params(
        ("x-user-id" = Option<String>, Header, description = "Session user, defaults to the demo user")
    ),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;
    let updates = UserUpdate {
        name: payload.name,
        company: payload.company,
        avatar: payload.avatar,
        is_active: None,
    };
    let user = state
        .storage
        .update_user(&session.user_id, updates)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}
