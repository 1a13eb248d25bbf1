#![cfg(unix)]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::{Value, json};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_dashboard_stats_for_demo_user() {
    let app = TestApp::new("exit 0\n").await;

    let response = app.send(get("/api/dashboard/stats/user-1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["totalGstCollection"], 22500.0);
    assert_eq!(stats["processedReturns"], 1);
    assert_eq!(stats["pendingActions"], 1);
    assert_eq!(stats["complianceScore"], 50);
    assert_eq!(stats["uploadedFilesCount"], 0);
    assert_eq!(stats["recentInvoices"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_user_gets_empty_collections() {
    let app = TestApp::new("exit 0\n").await;

    let stats = body_json(app.send(get("/api/dashboard/stats/ghost")).await).await;
    assert_eq!(stats["complianceScore"], 0);
    assert_eq!(stats["recentInvoices"], json!([]));

    let invoices = body_json(app.send(get("/api/invoices/ghost")).await).await;
    assert_eq!(invoices, json!([]));
}

#[tokio::test]
async fn test_returns_listed_newest_period_first_and_updated() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/gst-returns",
            json!({
                "userId": "user-1",
                "returnType": "GSTR-1",
                "period": "01-2025",
                "status": "Draft"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let returns = body_json(app.send(get("/api/gst-returns/user-1")).await).await;
    let periods: Vec<&str> = returns
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["period"].as_str().unwrap())
        .collect();
    assert_eq!(periods, vec!["01-2025", "04-2024", "03-2024"]);

    let response = app
        .send(json_request(
            "PATCH",
            &format!("/api/gst-returns/{}", id),
            json!({ "status": "Filed", "totalTax": "1200" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "Filed");
    assert_eq!(updated["totalTax"], "1200");
    assert!(updated["filedAt"].is_string());

    let chart = body_json(app.send(get("/api/charts/compliance/user-1")).await).await;
    assert_eq!(
        chart,
        json!({ "labels": ["Completed", "Pending", "Overdue"], "data": [2, 1, 0] })
    );

    let response = app
        .send(json_request(
            "PATCH",
            "/api/gst-returns/missing",
            json!({ "status": "Filed" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_return_period_is_rejected() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/gst-returns",
            json!({
                "userId": "user-1",
                "returnType": "GSTR-1",
                "period": "2025",
                "status": "Draft"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_creation_and_trend() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/invoices",
            json!({
                "userId": "user-1",
                "invoiceNumber": "INV-2025-010",
                "gstin": "29AABCT1332L000",
                "amount": "1000",
                "taxAmount": "180"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let invoice = body_json(response).await;
    assert_eq!(invoice["status"], "processed");

    let invoices = body_json(app.send(get("/api/invoices/user-1")).await).await;
    assert_eq!(invoices.as_array().unwrap().len(), 3);

    // Seeded and new invoices are all stamped this month
    let trend = body_json(app.send(get("/api/charts/gst-trends/user-1")).await).await;
    assert_eq!(trend["labels"].as_array().unwrap().len(), 6);
    assert_eq!(trend["data"][5], 22680.0);
}

#[tokio::test]
async fn test_invoice_with_bad_gstin_is_rejected() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/invoices",
            json!({ "userId": "user-1", "invoiceNumber": "INV-1", "gstin": "29AAB" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_upload_records_each_file() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(multipart_request(
            "/api/files/upload",
            &[
                text("userId", "user-1"),
                file("invoice.pdf", "application/pdf", PDF_BYTES),
                file("notes.txt", "text/plain", b"not an invoice"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["fileName"], "invoice.pdf");
    assert_eq!(files[0]["status"], "completed");
    assert_eq!(files[0]["fileSize"], PDF_BYTES.len());
    assert_eq!(files[1]["status"], "error");

    let listed = body_json(app.send(get("/api/files/user-1")).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let stats = body_json(app.send(get("/api/dashboard/stats/user-1")).await).await;
    assert_eq!(stats["uploadedFilesCount"], 2);
}

#[tokio::test]
async fn test_file_upload_requires_user_and_files() {
    let app = TestApp::new("exit 0\n").await;

    let response = app
        .send(multipart_request(
            "/api/files/upload",
            &[file("invoice.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "User ID is required");

    let response = app
        .send(multipart_request("/api/files/upload", &[text("userId", "user-1")]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No files uploaded");
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let app = TestApp::new("exit 0\n").await;

    let me = body_json(app.send(get("/api/users/me")).await).await;
    assert_eq!(me["id"], "user-1");
    assert_eq!(me["email"], "demo@example.com");
    assert!(me.get("password").is_none());

    let response = app
        .send(json_request(
            "PUT",
            "/api/users/me",
            json!({ "company": "Tech Corp India" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["company"], "Tech Corp India");
    assert_eq!(me["name"], "John Doe");
}

#[tokio::test]
async fn test_system_endpoints() {
    let app = TestApp::new("exit 0\n").await;

    let rules = body_json(app.send(get("/api/system/upload-rules")).await).await;
    assert_eq!(
        rules,
        json!({
            "allowedMimeTypes": ["application/pdf", "image/png", "image/jpeg"],
            "maxFileSize": 52428800,
            "maxBatchFiles": 20
        })
    );

    let response = app.send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["extractor"], "available");
    assert_eq!(health["artifact"], "absent");
}
