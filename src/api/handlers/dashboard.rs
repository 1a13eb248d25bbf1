use crate::AppState;
use crate::api::error::AppError;
use crate::models::{GstReturn, Invoice, ReturnStatus};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

const RECENT_INVOICES: usize = 5;
const TREND_MONTHS: u32 = 6;
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_gst_collection: f64,
    pub processed_returns: usize,
    pub pending_actions: usize,
    /// Percentage of returns filed, rounded
    pub compliance_score: u32,
    pub recent_invoices: Vec<Invoice>,
    pub uploaded_files_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendChart {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplianceChart {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

fn count_status(returns: &[GstReturn], status: ReturnStatus) -> usize {
    returns.iter().filter(|r| r.status == status).count()
}

pub fn compute_stats(
    returns: &[GstReturn],
    invoices: &[Invoice],
    uploaded_files_count: usize,
) -> DashboardStats {
    let filed = count_status(returns, ReturnStatus::Filed);
    let compliance = (filed as f64 / returns.len().max(1) as f64 * 100.0).round() as u32;

    let mut recent: Vec<Invoice> = invoices.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_INVOICES);

    DashboardStats {
        total_gst_collection: invoices.iter().map(Invoice::tax_value).sum(),
        processed_returns: filed,
        pending_actions: count_status(returns, ReturnStatus::Pending),
        compliance_score: compliance,
        recent_invoices: recent,
        uploaded_files_count,
    }
}

/// Invoice tax summed per calendar month, for the six months ending at `now`.
pub fn monthly_tax_trend(invoices: &[Invoice], now: DateTime<Utc>) -> TrendChart {
    // Months counted from year 0 so the window can cross a year boundary
    let current = now.year() * 12 + now.month0() as i32;
    let first = current - (TREND_MONTHS as i32 - 1);

    let mut data = vec![0.0; TREND_MONTHS as usize];
    for invoice in invoices {
        let Some(created) = invoice.created_at else {
            continue;
        };
        let month = created.year() * 12 + created.month0() as i32;
        if (first..=current).contains(&month) {
            data[(month - first) as usize] += invoice.tax_value();
        }
    }

    let labels = (first..=current)
        .map(|m| MONTH_LABELS[m.rem_euclid(12) as usize].to_string())
        .collect();

    TrendChart { labels, data }
}

pub fn compliance_chart(returns: &[GstReturn]) -> ComplianceChart {
    ComplianceChart {
        labels: vec![
            "Completed".to_string(),
            "Pending".to_string(),
            "Overdue".to_string(),
        ],
        data: vec![
            count_status(returns, ReturnStatus::Filed),
            count_status(returns, ReturnStatus::Pending),
            count_status(returns, ReturnStatus::Overdue),
        ],
    }
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Dashboard summary", body = DashboardStats)),
    tag = "dashboard"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardStats>, AppError> {
    let returns = state.storage.get_gst_returns(&user_id).await?;
    let invoices = state.storage.get_invoices(&user_id).await?;
    let files = state.storage.get_uploaded_files(&user_id).await?;

    Ok(Json(compute_stats(&returns, &invoices, files.len())))
}

#[utoipa::path(
    get,
    path = "/api/charts/gst-trends/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Tax collected per month", body = TrendChart)),
    tag = "dashboard"
)]
pub async fn gst_trends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TrendChart>, AppError> {
    let invoices = state.storage.get_invoices(&user_id).await?;
    Ok(Json(monthly_tax_trend(&invoices, Utc::now())))
}

#[utoipa::path(
    get,
    path = "/api/charts/compliance/{user_id}",
    params(("user_id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Returns by filing state", body = ComplianceChart)),
    tag = "dashboard"
)]
pub async fn compliance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ComplianceChart>, AppError> {
    let returns = state.storage.get_gst_returns(&user_id).await?;
    Ok(Json(compliance_chart(&returns)))
}
