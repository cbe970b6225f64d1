//! HTTP tests driven through the router with `oneshot`.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use puddle_api::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const FIXTURE: &str = include_str!("../../spml/tests/fixtures/asl-sample.spml");
const LIMIT: usize = 1024 * 1024;

fn app() -> Router {
    create_app(AppState::in_memory().unwrap(), LIMIT)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn import_fixture(app: &Router, owner: &str) -> Value {
    let (status, body) = send_json(
        app,
        json_request(
            Method::POST,
            "/v1/spml/import",
            json!({ "xml": FIXTURE, "owner_id": owner, "tags": ["asl"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send_json(&app(), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_count_imports() {
    let app = app();
    import_fixture(&app, "alice").await;
    send(
        &app,
        json_request(Method::POST, "/v1/spml/import", json!({ "xml": "<spml>" })),
    )
    .await;

    let (status, bytes) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("puddle_imports_total{outcome=\"success\"} 1"));
    assert!(text.contains("puddle_imports_total{outcome=\"failure\"} 1"));
}

// ============================================================================
// SPML documents
// ============================================================================

#[tokio::test]
async fn test_import_returns_document_dictionary_and_signs() {
    let app = app();
    let body = import_fixture(&app, "alice").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["dictionary"]["name"], "ASL Puddle");
    assert_eq!(body["dictionary"]["puddle_id"], 4);
    assert_eq!(body["dictionary"]["owner_id"], "alice");
    let signs = body["signs"].as_array().unwrap();
    assert_eq!(signs.len(), 2);
    assert_eq!(signs[0]["puddle_sign_id"], 1);
    assert_eq!(signs[0]["glosses"], json!(["hello", "hi"]));
    assert_eq!(body["stored_document"]["partition_key"], "sgn");
}

#[tokio::test]
async fn test_import_rejects_empty_upload() {
    let (status, body) = send_json(
        &app(),
        json_request(Method::POST, "/v1/spml/import", json!({ "xml": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Failed to import:"));
}

#[tokio::test]
async fn test_import_reports_malformed_xml() {
    let (status, body) = send_json(
        &app(),
        json_request(
            Method::POST,
            "/v1/spml/import",
            json!({ "xml": "<spml><entry id=\"1\"></spml>" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversized_upload_is_refused() {
    let app = create_app(AppState::in_memory().unwrap(), 256);
    let (status, _) = send(
        &app,
        json_request(Method::POST, "/v1/spml/import", json!({ "xml": FIXTURE })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_document_lifecycle() {
    let app = app();
    let imported = import_fixture(&app, "alice").await;
    let id = imported["stored_document"]["id"].as_str().unwrap().to_string();

    let (status, doc) = send_json(&app, get(&format!("/v1/spml/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["owner_id"], "alice");

    let (status, doc) = send_json(
        &app,
        json_request(
            Method::PUT,
            &format!("/v1/spml/{}", id),
            json!({ "description": "ASL snapshot", "tags": ["asl", "2011"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["description"], "ASL snapshot");
    assert_eq!(doc["tags"], json!(["2011", "asl"]));

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/v1/spml/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send_json(&app, get(&format!("/v1/spml/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_document_is_404() {
    let app = app();
    let (status, _) = send_json(&app, get("/v1/spml/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/v1/spml/nope/export")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(
        &app,
        json_request(Method::PUT, "/v1/spml/nope", json!({ "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_returns_original_xml() {
    let app = app();
    let imported = import_fixture(&app, "alice").await;
    let id = imported["stored_document"]["id"].as_str().unwrap();

    let resp = app
        .clone()
        .oneshot(get(&format!("/v1/spml/{}/export", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/xml"));

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(xml, FIXTURE);
    assert_eq!(spml::parse_spml(&xml).unwrap().entries.len(), 5);
}

#[tokio::test]
async fn test_list_filters_and_stats() {
    let app = app();
    import_fixture(&app, "alice").await;
    import_fixture(&app, "bob").await;

    let (_, all) = send_json(&app, get("/v1/spml")).await;
    assert_eq!(all["count"], 2);

    let (_, by_owner) = send_json(&app, get("/v1/spml?owner=bob")).await;
    assert_eq!(by_owner["count"], 1);
    assert_eq!(by_owner["documents"][0]["owner_id"], "bob");

    let (_, by_type) = send_json(&app, get("/v1/spml?type=sgn&puddle=4")).await;
    assert_eq!(by_type["count"], 2);

    let (_, none) = send_json(&app, get("/v1/spml?puddle=99")).await;
    assert_eq!(none["count"], 0);

    let (status, stats) = send_json(&app, get("/v1/spml/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_documents"], 2);
    assert_eq!(stats["total_entries"], 10);
    assert_eq!(stats["documents_by_type"]["sgn"], 2);
    assert_eq!(stats["documents_by_owner"]["alice"], 1);
}

// ============================================================================
// Dictionaries
// ============================================================================

#[tokio::test]
async fn test_dictionary_import_then_merge() {
    let app = app();
    let request = || {
        json_request(
            Method::POST,
            "/v1/dictionaries/import",
            json!({ "xml": FIXTURE, "owner_id": "alice" }),
        )
    };

    let (status, first) = send_json(&app, request()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"], true);
    assert_eq!(first["added"], 2);
    assert_eq!(first["skipped"], 3);

    let (status, second) = send_json(&app, request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["added"], 0);
    assert_eq!(second["unchanged"], 2);
    assert_eq!(second["dictionary"]["id"], first["dictionary"]["id"]);

    let (_, list) = send_json(&app, get("/v1/dictionaries")).await;
    assert_eq!(list["count"], 1);

    let id = first["dictionary"]["id"].as_str().unwrap();
    let (status, signs) = send_json(&app, get(&format!("/v1/dictionaries/{}/signs", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signs["count"], 2);
    assert_eq!(signs["signs"][1]["glosses"], json!(["test zero"]));

    let (_, bytes) = send(&app, get("/metrics")).await;
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("puddle_signs_written_total{kind=\"added\"} 2"));
}

#[tokio::test]
async fn test_dictionary_import_errors() {
    let app = app();
    let (status, _) = send_json(
        &app,
        json_request(Method::POST, "/v1/dictionaries/import", json!({ "xml": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &app,
        json_request(Method::POST, "/v1/dictionaries/import", json!({ "xml": "<spml>" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("PARSE/"));

    let (status, _) = send_json(&app, get("/v1/dictionaries/unknown/signs")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
