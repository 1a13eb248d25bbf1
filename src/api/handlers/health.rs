use crate::AppState;
use crate::utils::validation::UploadRules;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub extractor: String,
    pub artifact: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let extractor_status = if state.extraction.extractor_available() {
        "available"
    } else {
        "missing"
    };

    let artifact_status = if state.artifact.is_present().await {
        "present"
    } else {
        "absent"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        extractor: extractor_status.to_string(),
        artifact: artifact_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/system/upload-rules",
    responses(
        (status = 200, description = "Accepted types and size limits", body = UploadRules)
    ),
    tag = "system"
)]
pub async fn get_upload_rules(State(state): State<AppState>) -> Json<UploadRules> {
    Json(UploadRules::from_config(&state.config))
}
