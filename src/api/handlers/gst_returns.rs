use crate::AppState;
use crate::api::error::AppError;
use crate::models::{GstReturn, NewGstReturn, ReturnStatus};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GstReturnUpdate {
    pub status: ReturnStatus,
    pub total_tax: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/gst-returns/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Returns, newest period first", body = [GstReturn])),
    tag = "dashboard"
)]
pub async fn list_gst_returns(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GstReturn>>, AppError> {
    Ok(Json(state.storage.get_gst_returns(&user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/gst-returns",
    request_body = NewGstReturn,
    responses(
        (status = 201, description = "Return created", body = GstReturn),
        (status = 400, description = "Invalid input")
    ),
    tag = "dashboard"
)]
pub async fn create_gst_return(
    State(state): State<AppState>,
    Json(payload): Json<NewGstReturn>,
) -> Result<(StatusCode, Json<GstReturn>), AppError> {
    payload.validate()?;
    let created = state.storage.create_gst_return(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    patch,
    path = "/api/gst-returns/{id}",
    params(("id" = String, Path, description = "Return ID")),
    request_body = GstReturnUpdate,
    responses(
        (status = 200, description = "Return updated", body = GstReturn),
        (status = 404, description = "Return not found")
    ),
    tag = "dashboard"
)]
pub async fn update_gst_return(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<GstReturnUpdate>,
) -> Result<Json<GstReturn>, AppError> {
    let updated = state
        .storage
        .update_gst_return(&id, payload.status, payload.total_tax)
        .await?
        .ok_or_else(|| AppError::NotFound("GST return not found".to_string()))?;
    Ok(Json(updated))
}
