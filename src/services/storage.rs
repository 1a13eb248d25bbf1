use crate::models::{
    DownloadHistory, GstReturn, Invoice, NewDownloadHistory, NewGstReturn, NewInvoice,
    NewUploadedFile, NewUser, UploadedFile, UploadedFileUpdate, User, UserUpdate,
};
use crate::models::{FileStatus, ReturnStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Persistence collaborator for everything the dashboard reads and writes.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn update_user(&self, id: &str, updates: UserUpdate) -> Result<Option<User>>;

    async fn get_gst_returns(&self, user_id: &str) -> Result<Vec<GstReturn>>;
    async fn create_gst_return(&self, gst_return: NewGstReturn) -> Result<GstReturn>;
    async fn update_gst_return(
        &self,
        id: &str,
        status: ReturnStatus,
        total_tax: Option<String>,
    ) -> Result<Option<GstReturn>>;

    async fn get_invoices(&self, user_id: &str) -> Result<Vec<Invoice>>;
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice>;
    async fn get_invoice_by_id(&self, id: &str) -> Result<Option<Invoice>>;

    async fn get_uploaded_files(&self, user_id: &str) -> Result<Vec<UploadedFile>>;
    async fn create_uploaded_file(&self, file: NewUploadedFile) -> Result<UploadedFile>;
    async fn update_uploaded_file(
        &self,
        id: &str,
        updates: UploadedFileUpdate,
    ) -> Result<Option<UploadedFile>>;

    /// Newest first by `downloaded_at`; records without a timestamp sort last.
    async fn get_download_history(&self, user_id: &str) -> Result<Vec<DownloadHistory>>;
    async fn create_download_history(&self, download: NewDownloadHistory)
    -> Result<DownloadHistory>;
    async fn delete_download_history(&self, id: &str) -> Result<bool>;
}

/// In-memory storage. Every map is independently sharded, so handlers on
/// different worker threads never contend on a single lock.
#[derive(Default)]
pub struct MemStorage {
    users: DashMap<String, User>,
    gst_returns: DashMap<String, GstReturn>,
    invoices: DashMap<String, Invoice>,
    uploaded_files: DashMap<String, UploadedFile>,
    download_history: DashMap<String, DownloadHistory>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed user, keeping its id. Used by seeding.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_gst_return(&self, gst_return: GstReturn) {
        self.gst_returns.insert(gst_return.id.clone(), gst_return);
    }

    pub fn insert_invoice(&self, invoice: Invoice) {
        self.invoices.insert(invoice.id.clone(), invoice);
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            name: user.name,
            company: user.company,
            avatar: None,
            password: user.password,
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, updates: UserUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = updates.name {
            user.name = name;
        }
        if updates.company.is_some() {
            user.company = updates.company;
        }
        if updates.avatar.is_some() {
            user.avatar = updates.avatar;
        }
        if let Some(active) = updates.is_active {
            user.is_active = active;
        }
        user.updated_at = Some(Utc::now());
        Ok(Some(user.clone()))
    }

    async fn get_gst_returns(&self, user_id: &str) -> Result<Vec<GstReturn>> {
        let mut returns: Vec<GstReturn> = self
            .gst_returns
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        returns.sort_by(|a, b| b.period_key().cmp(&a.period_key()));
        Ok(returns)
    }

    async fn create_gst_return(&self, gst_return: NewGstReturn) -> Result<GstReturn> {
        let now = Utc::now();
        let filed_at = (gst_return.status == ReturnStatus::Filed).then_some(now);
        let gst_return = GstReturn {
            id: Uuid::new_v4().to_string(),
            user_id: gst_return.user_id,
            return_type: gst_return.return_type,
            period: gst_return.period,
            status: gst_return.status,
            total_tax: gst_return.total_tax,
            filed_at,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.gst_returns
            .insert(gst_return.id.clone(), gst_return.clone());
        Ok(gst_return)
    }

    async fn update_gst_return(
        &self,
        id: &str,
        status: ReturnStatus,
        total_tax: Option<String>,
    ) -> Result<Option<GstReturn>> {
        let Some(mut gst_return) = self.gst_returns.get_mut(id) else {
            return Ok(None);
        };
        let now = Utc::now();
        if status == ReturnStatus::Filed && gst_return.status != ReturnStatus::Filed {
            gst_return.filed_at = Some(now);
        }
        gst_return.status = status;
        if total_tax.is_some() {
            gst_return.total_tax = total_tax;
        }
        gst_return.updated_at = Some(now);
        Ok(Some(gst_return.clone()))
    }

    async fn get_invoices(&self, user_id: &str) -> Result<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.value().clone())
            .collect();
        invoices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(invoices)
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice> {
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            user_id: invoice.user_id,
            invoice_number: invoice.invoice_number,
            gstin: invoice.gstin,
            buyer_name: invoice.buyer_name,
            amount: invoice.amount,
            tax_amount: invoice.tax_amount,
            hsn_code: invoice.hsn_code,
            status: "processed".to_string(),
            file_name: invoice.file_name,
            created_at: Some(Utc::now()),
        };
        self.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self.invoices.get(id).map(|i| i.value().clone()))
    }

    async fn get_uploaded_files(&self, user_id: &str) -> Result<Vec<UploadedFile>> {
        let mut files: Vec<UploadedFile> = self
            .uploaded_files
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.value().clone())
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    async fn create_uploaded_file(&self, file: NewUploadedFile) -> Result<UploadedFile> {
        let file = UploadedFile {
            id: Uuid::new_v4().to_string(),
            user_id: file.user_id,
            file_name: file.file_name,
            file_size: file.file_size,
            file_type: file.file_type,
            status: FileStatus::Processing,
            extracted_data: file.extracted_data,
            created_at: Some(Utc::now()),
        };
        self.uploaded_files.insert(file.id.clone(), file.clone());
        Ok(file)
    }

    async fn update_uploaded_file(
        &self,
        id: &str,
        updates: UploadedFileUpdate,
    ) -> Result<Option<UploadedFile>> {
        let Some(mut file) = self.uploaded_files.get_mut(id) else {
            return Ok(None);
        };
        if let Some(status) = updates.status {
            file.status = status;
        }
        if updates.extracted_data.is_some() {
            file.extracted_data = updates.extracted_data;
        }
        Ok(Some(file.clone()))
    }

    async fn get_download_history(&self, user_id: &str) -> Result<Vec<DownloadHistory>> {
        let mut downloads: Vec<DownloadHistory> = self
            .download_history
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.value().clone())
            .collect();
        // Option orders None before Some, so reversing puts missing timestamps last.
        downloads.sort_by(|a, b| b.downloaded_at.cmp(&a.downloaded_at));
        Ok(downloads)
    }

    async fn create_download_history(
        &self,
        download: NewDownloadHistory,
    ) -> Result<DownloadHistory> {
        let record = DownloadHistory {
            id: Uuid::new_v4().to_string(),
            user_id: download.user_id,
            filename: download.filename,
            file_type: download.file_type.unwrap_or_else(|| "excel".to_string()),
            invoices_count: download.invoices_count.unwrap_or(0),
            file_size: download.file_size,
            downloaded_at: Some(Utc::now()),
        };
        self.download_history
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn delete_download_history(&self, id: &str) -> Result<bool> {
        Ok(self.download_history.remove(id).is_some())
    }
}
