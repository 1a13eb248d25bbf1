pub mod dashboard;
pub mod download;
pub mod extract;
pub mod files;
pub mod gst_returns;
pub mod health;
pub mod history;
pub mod intake;
pub mod invoices;
pub mod users;
