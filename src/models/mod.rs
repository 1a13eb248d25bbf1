use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub company: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub company: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Partial update applied by [`crate::services::storage::Storage::update_user`]
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub is_active: Option<bool>,
}

/// Return filing state. Serialized with the capitalized names the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReturnStatus {
    Filed,
    Pending,
    Overdue,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GstReturn {
    pub id: String,
    pub user_id: String,
    /// GSTR-1, GSTR-3B, ...
    pub return_type: String,
    /// MM-YYYY
    pub period: String,
    pub status: ReturnStatus,
    pub total_tax: Option<String>,
    pub filed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GstReturn {
    /// Period as (year, month) for ordering; malformed periods sort first.
    pub fn period_key(&self) -> (u32, u32) {
        let mut parts = self.period.splitn(2, '-');
        let month = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
        let year = parts.next().and_then(|y| y.parse().ok()).unwrap_or(0);
        (year, month)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGstReturn {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 32, message = "Return type is required"))]
    pub return_type: String,
    #[validate(length(equal = 7, message = "Period must be formatted as MM-YYYY"))]
    pub period: String,
    pub status: ReturnStatus,
    pub total_tax: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    pub invoice_number: String,
    pub gstin: Option<String>,
    pub buyer_name: Option<String>,
    /// Decimal amount as entered, e.g. "50000"
    pub amount: Option<String>,
    pub tax_amount: Option<String>,
    pub hsn_code: Option<String>,
    pub status: String,
    pub file_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn tax_value(&self) -> f64 {
        self.tax_amount
            .as_deref()
            .and_then(|t| t.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64, message = "Invoice number is required"))]
    pub invoice_number: String,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gstin: Option<String>,
    pub buyer_name: Option<String>,
    pub amount: Option<String>,
    pub tax_amount: Option<String>,
    pub hsn_code: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub status: FileStatus,
    pub extracted_data: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUploadedFile {
    pub user_id: String,
    pub file_name: String,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub extracted_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadedFileUpdate {
    pub status: Option<FileStatus>,
    pub extracted_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadHistory {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_type: String,
    pub invoices_count: u64,
    pub file_size: Option<u64>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewDownloadHistory {
    pub user_id: String,
    pub filename: String,
    pub file_type: Option<String>,
    pub invoices_count: Option<u64>,
    pub file_size: Option<u64>,
}
