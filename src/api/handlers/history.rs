use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::session::Session;
use crate::models::DownloadHistory;
use axum::{Extension, Json, extract::State};

#[utoipa::path(
    get,
    path = "/api/download-history",
    responses(
        (status = 200, description = "Session user's downloads, newest first", body = [DownloadHistory]),
        (status = 401, description = "Unknown session user")
    ),
    params(
        ("x-user-id" = Option<String>, Header, description = "Session user, defaults to the demo user")
    ),
    tag = "extraction"
)]
pub async fn download_history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<DownloadHistory>>, AppError> {
    let history = state
        .storage
        .get_download_history(&session.user_id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch download history: {}", e)))?;
    Ok(Json(history))
}
