//! End-to-end tests for `POST /api/process` against a mocked generation service.

mod common;

use axum::http::StatusCode;
use common::{body_json, body_text, build_test_app, build_test_app_with, post_file};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";
const ARTIFACT: &[u8] = b"#usda 1.0\n( defaultPrim = \"GeneratedObject\" )\n";

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "data": data }))
}

fn status(value: &str) -> ResponseTemplate {
    ok(json!({ "task_id": "c1", "status": value, "progress": 50 }))
}

async fn mount_submission(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ok(json!({ "image_token": "tok1" })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/task"))
        .and(body_partial_json(json!({
            "type": "image_to_model",
            "file": { "type": "png", "file_token": "tok1" }
        })))
        .respond_with(ok(json!({ "task_id": "g1" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_conversion(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/task"))
        .and(body_partial_json(json!({
            "type": "convert_model",
            "original_model_task_id": "g1",
            "format": "USDZ",
            "quad": true,
            "face_limit": 5000
        })))
        .respond_with(ok(json!({ "task_id": "c1" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_success(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/task/c1"))
        .respond_with(status("running"))
        .up_to_n_times(2)
        .mount(server)
        .await;

    let url = format!("{}/files/model.usdz", server.uri());
    Mock::given(method("GET"))
        .and(path("/task/c1"))
        .respond_with(ok(json!({
            "task_id": "c1",
            "status": "success",
            "progress": 100,
            "result": { "model": { "type": "usdz", "url": url } }
        })))
        .mount(server)
        .await;
}

async fn artifact_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/files/model.usdz")
        .count()
}

#[tokio::test]
async fn successful_generation_returns_stored_mesh() {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_conversion(&server).await;
    mount_success(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/model.usdz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ARTIFACT))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_test_app(&server.uri());
    let response = post_file(app.router.clone(), "/api/process", "file", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let mesh = &json["mesh_data"];
    assert_eq!(mesh["id"], 1);
    assert_eq!(mesh["name"], "GeneratedObject");
    assert_eq!(
        mesh["data"],
        meshgen_db::models::mesh_object::to_hex(ARTIFACT)
    );
    assert_eq!(mesh["upload_time"].as_str().unwrap().len(), 19);
    assert!(json.get("photo_base64").is_none());

    assert_eq!(
        app.store.store_calls(),
        vec![("GeneratedObject".to_string(), ARTIFACT.to_vec())]
    );
    assert_eq!(app.store.fetch_calls(), vec![1]);
    assert_eq!(std::fs::read(&app.artifact_path).unwrap(), ARTIFACT);
}

#[tokio::test]
async fn missing_file_field_is_plain_text_bad_request() {
    let server = MockServer::start().await;
    let app = build_test_app(&server.uri());

    let response = post_file(app.router.clone(), "/api/process", "photo", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert!(body_text(response).await.contains("'file'"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn rejected_conversion_is_bad_gateway_without_download() {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    Mock::given(method("POST"))
        .and(path("/task"))
        .and(body_partial_json(json!({ "type": "convert_model" })))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 2010,
            "message": "insufficient credit"
        })))
        .mount(&server)
        .await;

    let app = build_test_app(&server.uri());
    let response = post_file(app.router.clone(), "/api/process", "file", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let text = body_text(response).await;
    assert!(text.starts_with("conversion task stage failed"), "{text}");
    assert!(text.contains("insufficient credit"), "{text}");
    assert_eq!(artifact_requests(&server).await, 0);
    assert!(app.store.store_calls().is_empty());
}

#[tokio::test]
async fn failed_remote_task_is_bad_gateway() {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_conversion(&server).await;
    Mock::given(method("GET"))
        .and(path("/task/c1"))
        .respond_with(status("banned"))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_test_app(&server.uri());
    let response = post_file(app.router.clone(), "/api/process", "file", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("task banned"));
    assert!(app.store.store_calls().is_empty());
}

#[tokio::test]
async fn task_that_never_finishes_is_gateway_timeout() {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_conversion(&server).await;
    Mock::given(method("GET"))
        .and(path("/task/c1"))
        .respond_with(status("running"))
        .expect(3)
        .mount(&server)
        .await;

    let app = build_test_app_with(&server.uri(), |c| c.pipeline.poll.max_attempts = 3);
    let response = post_file(app.router.clone(), "/api/process", "file", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(body_text(response).await.contains("after 3 status queries"));
    assert_eq!(artifact_requests(&server).await, 0);
}

#[tokio::test]
async fn missing_artifact_is_bad_gateway_and_nothing_is_stored() {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_conversion(&server).await;
    mount_success(&server).await;
    Mock::given(method("GET"))
        .and(path("/files/model.usdz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = build_test_app(&server.uri());
    let response = post_file(app.router.clone(), "/api/process", "file", "chair.png", IMAGE).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("HTTP 404"));
    assert!(app.store.store_calls().is_empty());
    assert!(app.store.fetch_calls().is_empty());
}
