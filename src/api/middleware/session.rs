use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller a request acts on behalf of
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
}

/// Resolves the session user from `x-user-id`, falling back to the configured
/// default user. The user must exist and be active.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(&state.config.default_user_id)
        .to_string();

    let user = state.storage.get_user(&user_id).await.map_err(|e| {
        tracing::error!("Session lookup failed for {}: {}", user_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match user {
        Some(user) if user.is_active => {
            req.extensions_mut().insert(Session { user_id });
            Ok(next.run(req).await)
        }
        _ => {
            tracing::warn!("Rejected request for unknown or inactive user {}", user_id);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
