use crate::models::{GstReturn, Invoice, ReturnStatus, User};
use crate::services::storage::MemStorage;
use chrono::Utc;
use tracing::info;

pub const DEMO_USER_ID: &str = "user-1";

/// Seeds the demo account the dashboard signs in as, with a filed and a
/// pending return and two processed invoices.
pub fn seed_demo_data(storage: &MemStorage) {
    info!("🌱 Seeding demo data...");
    let now = Utc::now();

    storage.insert_user(User {
        id: DEMO_USER_ID.to_string(),
        email: "demo@example.com".to_string(),
        name: "John Doe".to_string(),
        company: Some("Tech Corp".to_string()),
        avatar: Some("/api/placeholder/40/40".to_string()),
        password: "password".to_string(),
        is_active: true,
        created_at: Some(now),
        updated_at: Some(now),
    });

    let returns = [
        ("return-1", "GSTR-1", "03-2024", ReturnStatus::Filed, "245680"),
        ("return-2", "GSTR-3B", "04-2024", ReturnStatus::Pending, "0"),
    ];
    for (id, return_type, period, status, total_tax) in returns {
        storage.insert_gst_return(GstReturn {
            id: id.to_string(),
            user_id: DEMO_USER_ID.to_string(),
            return_type: return_type.to_string(),
            period: period.to_string(),
            status,
            total_tax: Some(total_tax.to_string()),
            filed_at: (status == ReturnStatus::Filed).then_some(now),
            created_at: Some(now),
            updated_at: Some(now),
        });
    }

    let invoices = [
        ("invoice-1", "INV-2024-001", "ABC Company Ltd", "50000", "9000", "8517", "invoice_001.pdf"),
        ("invoice-2", "INV-2024-002", "XYZ Enterprises", "75000", "13500", "8471", "invoice_002.pdf"),
    ];
    for (id, number, buyer, amount, tax, hsn, file_name) in invoices {
        storage.insert_invoice(Invoice {
            id: id.to_string(),
            user_id: DEMO_USER_ID.to_string(),
            invoice_number: number.to_string(),
            gstin: Some("29AABCT1332L000".to_string()),
            buyer_name: Some(buyer.to_string()),
            amount: Some(amount.to_string()),
            tax_amount: Some(tax.to_string()),
            hsn_code: Some(hsn.to_string()),
            status: "processed".to_string(),
            file_name: Some(file_name.to_string()),
            created_at: Some(now),
        });
    }

    info!("✅ Demo data seeded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::Storage;

    #[tokio::test]
    async fn test_seed_creates_demo_user_with_data() {
        let storage = MemStorage::new();
        seed_demo_data(&storage);

        let user = storage.get_user(DEMO_USER_ID).await.unwrap().unwrap();
        assert_eq!(user.email, "demo@example.com");
        assert_eq!(storage.get_gst_returns(DEMO_USER_ID).await.unwrap().len(), 2);
        assert_eq!(storage.get_invoices(DEMO_USER_ID).await.unwrap().len(), 2);
        assert!(storage.get_download_history(DEMO_USER_ID).await.unwrap().is_empty());
    }
}
