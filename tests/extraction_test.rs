#![cfg(unix)]

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use std::time::Duration;

const MARKED_RESULT: &str = r#"printf 'xlsx-bytes' > "$GST_OUTPUT_PATH"
echo "[STATUS] Processing $# files..."
echo '[RESULT] {"success": true, "message": "ok", "invoices_count": 3}'
echo '{'
"#;

#[tokio::test]
async fn test_marker_line_is_parsed_amid_noise() {
    let app = TestApp::new(MARKED_RESULT).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("invoice.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "message": "ok",
            "invoices_count": 3,
            "download_url": "/api/download-excel"
        })
    );
    assert_eq!(std::fs::read(app.artifact_path()).unwrap(), b"xlsx-bytes");
}

#[tokio::test]
async fn test_unsuccessful_result_has_no_download_url() {
    let app = TestApp::new(
        r#"echo '[RESULT] {"success": false, "message": "No invoices found", "invoices_count": 0}'"#,
    )
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("blank.png", "image/png", PNG_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No invoices found");
    assert!(body["download_url"].is_null());
}

#[tokio::test]
async fn test_result_file_channel_wins_over_stdout() {
    let app = TestApp::new(
        r#"printf 'from-file' > "$GST_OUTPUT_PATH"
printf '{"success": true, "message": "from file", "invoices_count": 7}' > "$GST_RESULT_PATH"
echo '[RESULT] {"success": false, "message": "stdout"}'
"#,
    )
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "from file");
    assert_eq!(body["invoices_count"], 7);
}

#[tokio::test]
async fn test_whole_stdout_json_is_accepted_without_marker() {
    let app = TestApp::new(r#"echo '{"success": true, "message": "plain", "invoices_count": 1}'"#).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "plain");
}

#[tokio::test]
async fn test_unparseable_output_is_a_parse_error() {
    let app = TestApp::new("echo 'Traceback (most recent call last):'\necho 'boom' >&2\n").await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Failed to parse extraction output" })
    );
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_parse_error_diagnostics_are_opt_in() {
    let app = TestApp::with_config(
        "echo 'Traceback (most recent call last):'\necho 'boom' >&2\n",
        |config| config.expose_diagnostics = true,
    )
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to parse extraction output");
    assert!(body["debug"]["output"].as_str().unwrap().contains("Traceback"));
    assert!(body["debug"]["errorOutput"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn test_non_zero_exit_is_a_tool_failure() {
    let app = TestApp::new(
        "echo '[RESULT] {\"success\": true, \"message\": \"ok\"}'\necho 'secret detail' >&2\nexit 3\n",
    )
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Failed to process files" })
    );
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_failed_run_keeps_previous_spreadsheet() {
    let app = TestApp::new("printf 'half' > \"$GST_OUTPUT_PATH\"\nexit 1\n").await;
    std::fs::write(app.artifact_path(), b"previous").unwrap();

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read(app.artifact_path()).unwrap(), b"previous");
    let output_dir = app.artifact_path().parent().unwrap();
    assert_eq!(std::fs::read_dir(output_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_unwritable_scratch_dir_is_an_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let script = format!("touch '{}'\n", marker.display());
    let app = TestApp::new(&script).await;

    // A regular file where the run directory's parent should be
    let scratch = app.state.config.scratch_dir.clone();
    std::fs::remove_dir_all(&scratch).unwrap();
    std::fs::write(&scratch, b"not a directory").unwrap();

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );
    assert!(!marker.exists());
    assert!(!app.artifact_path().exists());
}

#[tokio::test]
async fn test_missing_program_is_a_tool_failure() {
    let app = TestApp::with_config(MARKED_RESULT, |config| {
        config.extractor_program = "/nonexistent/extractor".to_string();
    })
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to process files");
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_slow_tool_times_out() {
    let app = TestApp::with_config("exec sleep 5\n", |config| {
        config.extraction_timeout = Duration::from_millis(200);
    })
    .await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("a.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error"], "Extraction timed out");
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_tool_sees_every_file_and_files_are_removed_afterwards() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("args.txt");
    let script = format!(
        r#"for f in "$@"; do
  if [ -f "$f" ]; then echo "$f" >> '{record}'; fi
done
echo "$PYTHONPATH" > '{record}.env'
echo '[RESULT] {{"success": true, "message": "ok", "invoices_count": 2}}'
"#,
        record = record.display()
    );
    let app = TestApp::new(&script).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[
                file("first.pdf", "application/pdf", PDF_BYTES),
                file("second.png", "image/png", PNG_BYTES),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let seen = std::fs::read_to_string(&record).unwrap();
    let paths: Vec<&str> = seen.lines().collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("_first.pdf"));
    assert!(paths[1].ends_with("_second.png"));
    for path in &paths {
        assert!(path.starts_with(app.state.config.scratch_dir.to_str().unwrap()));
        assert!(!std::path::Path::new(path).exists());
    }
    assert!(app.scratch_leftovers().is_empty());

    let support = std::fs::read_to_string(format!("{}.env", record.display())).unwrap();
    assert_eq!(support.trim(), app.state.config.extractor_support_path);
}

#[tokio::test]
async fn test_oversize_file_is_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let script = format!("touch '{}'\n", marker.display());
    let app = TestApp::with_config(&script, |config| config.max_file_size = 16).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("big.pdf", "application/pdf", PDF_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_json(response).await["error"].as_str().is_some());
    assert!(!marker.exists());
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_disallowed_type_rejects_the_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let script = format!("touch '{}'\n", marker.display());
    let app = TestApp::new(&script).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[
                file("ok.pdf", "application/pdf", PDF_BYTES),
                file("sheet.csv", "text/csv", b"a,b\n1,2\n"),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(!marker.exists());
    assert!(app.scratch_leftovers().is_empty());
}

#[tokio::test]
async fn test_content_that_contradicts_declared_type_is_rejected() {
    let app = TestApp::new(MARKED_RESULT).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("fake.pdf", "application/pdf", PNG_BYTES)],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_jpg_alias_is_accepted() {
    let app = TestApp::new(MARKED_RESULT).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[file("scan.jpg", "image/jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46])],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_files_is_a_bad_request() {
    let app = TestApp::new(MARKED_RESULT).await;

    let response = app
        .send(multipart_request("/api/extract-gst", &[text("note", "hello")]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "No files uploaded" })
    );
}

#[tokio::test]
async fn test_too_many_files_is_a_bad_request() {
    let app = TestApp::with_config(MARKED_RESULT, |config| config.max_batch_files = 1).await;

    let response = app
        .send(multipart_request(
            "/api/extract-gst",
            &[
                file("a.pdf", "application/pdf", PDF_BYTES),
                file("b.pdf", "application/pdf", PDF_BYTES),
            ],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_runs_never_tear_the_artifact() {
    // Writes half the input, pauses, then the whole input
    let app = TestApp::new(
        r#"head -c 4 "$1" > "$GST_OUTPUT_PATH"
sleep 0.2
cat "$1" > "$GST_OUTPUT_PATH"
echo '[RESULT] {"success": true, "message": "ok", "invoices_count": 1}'
"#,
    )
    .await;

    let first: &[u8] = b"%PDF-1.4 first run content";
    let second: &[u8] = b"%PDF-1.4 second run content, longer";

    let (a, b) = tokio::join!(
        app.send(multipart_request(
            "/api/extract-gst",
            &[file("one.pdf", "application/pdf", first)],
        )),
        app.send(multipart_request(
            "/api/extract-gst",
            &[file("two.pdf", "application/pdf", second)],
        )),
    );
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);

    let response = app.send(get("/api/download-excel")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body_bytes(response).await;
    assert!(bytes == first || bytes == second);
}
