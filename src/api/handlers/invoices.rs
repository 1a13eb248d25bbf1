use crate::AppState;
use crate::api::error::AppError;
use crate::models::{Invoice, NewInvoice};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/invoices/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Invoices, oldest first", body = [Invoice])),
    tag = "dashboard"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    Ok(Json(state.storage.get_invoices(&user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = NewInvoice,
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Invalid input")
    ),
    tag = "dashboard"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<NewInvoice>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    payload.validate()?;
    let invoice = state.storage.create_invoice(payload).await?;
    tracing::info!("🧾 Invoice {} recorded for {}", invoice.invoice_number, invoice.user_id);
    Ok((StatusCode::CREATED, Json(invoice)))
}
