//! HTTP-level integration tests for document endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, file_part, get, post_json, post_multipart, text_part};

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_document_returns_201_with_share_token() {
    let pool = common::test_pool().await;
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/documents",
        serde_json::json!({
            "title": "Declaration of Independence",
            "description": "1776 engrossed copy",
            "imageUrl": "https://example.test/doi.png",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["title"], "Declaration of Independence");
    assert_eq!(json["description"], "1776 engrossed copy");
    assert_eq!(json["imageUrl"], "https://example.test/doi.png");
    assert!(json["shareToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["annotations"], serde_json::json!([]));
}

#[tokio::test]
async fn get_document_by_share_token() {
    let pool = common::test_pool().await;
    let created = common::create_document(&pool, "Magna Carta").await;
    let token = created["shareToken"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/documents/{token}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"], created["id"]);
    assert_eq!(json["title"], "Magna Carta");
}

#[tokio::test]
async fn get_document_lists_annotations_newest_first() {
    let pool = common::test_pool().await;
    let created = common::create_document(&pool, "Doc").await;
    let doc_id = created["id"].as_str().unwrap();
    let token = created["shareToken"].as_str().unwrap();

    for text in ["first", "second"] {
        let app = common::build_test_app(pool.clone());
        let response = post_json(
            app,
            "/api/annotations",
            serde_json::json!({
                "documentId": doc_id,
                "x": 0, "y": 0, "width": 20, "height": 20,
                "text": text,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let app = common::build_test_app(pool);
    let json = body_json(get(app, &format!("/api/documents/{token}")).await).await;
    let texts: Vec<_> = json["annotations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["second", "first"]);
}

#[tokio::test]
async fn unknown_share_token_returns_404() {
    let app = common::build_test_app(common::test_pool().await);
    let response = get(app, "/api/documents/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn blank_title_returns_400() {
    let app = common::build_test_app(common::test_pool().await);
    let response = post_json(
        app,
        "/api/documents",
        serde_json::json!({"title": "   ", "imageUrl": "x"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_returns_data_url() {
    let app = common::build_test_app(common::test_pool().await);
    let body = file_part("file", "scan.png", "image/png", b"hello");
    let response = post_multipart(app, "/api/documents/upload", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["imageUrl"], "data:image/png;base64,aGVsbG8=");
}

#[tokio::test]
async fn upload_without_file_returns_400() {
    let app = common::build_test_app(common::test_pool().await);
    let response = post_multipart(app, "/api/documents/upload", text_part("note", "hi")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_over_limit_returns_413() {
    // The test config allows 1024 bytes.
    let app = common::build_test_app(common::test_pool().await);
    let body = file_part("file", "big.png", "image/png", &vec![0u8; 2048]);
    let response = post_multipart(app, "/api/documents/upload", body).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
