#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use meshgen_api::config::{RemoteConfig, ScriptConfig, ServerConfig};
use meshgen_api::router::build_app_router;
use meshgen_api::state::AppState;
use meshgen_db::memory::MemoryMeshStore;
use meshgen_pipeline::config::PipelineConfig;
use meshgen_pipeline::fetcher::ArtifactFetcher;
use meshgen_pipeline::orchestrator::PipelineOrchestrator;
use meshgen_tripo::api::{ApiKey, TripoApi};
use meshgen_tripo::poll::PollPolicy;
use tower::ServiceExt;

pub const BOUNDARY: &str = "meshgen-test-boundary";

/// A fully wired application plus handles the tests inspect.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryMeshStore>,
    pub artifact_path: PathBuf,
    /// Keeps the artifact directory alive for the test's duration.
    pub workdir: tempfile::TempDir,
}

/// Build a test `ServerConfig` pointing at `base_url`.
///
/// The settle delay is zero and polling is fast and short so failure
/// paths finish quickly against a mock server.
pub fn test_config(base_url: &str, artifact_path: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        remote: RemoteConfig {
            base_url: base_url.to_string(),
            api_key: ApiKey::new("test-key").unwrap(),
        },
        pipeline: PipelineConfig {
            settle_delay: Duration::ZERO,
            poll: PollPolicy {
                interval: Duration::from_millis(10),
                max_attempts: 5,
                max_status_retries: 1,
                deadline: None,
            },
            ..PipelineConfig::new(artifact_path)
        },
        scripts: None,
    }
}

/// Build the application with an in-memory store and the real remote
/// client and fetcher aimed at `base_url`.
pub fn build_test_app(base_url: &str) -> TestApp {
    build_test_app_with(base_url, |_| {})
}

pub fn build_test_app_with(base_url: &str, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let workdir = tempfile::tempdir().unwrap();
    let artifact_path = workdir.path().join("artifacts/model.usdz");
    let mut config = test_config(base_url, artifact_path.clone());
    configure(&mut config);

    let store = Arc::new(MemoryMeshStore::new());
    let tasks = Arc::new(
        TripoApi::new(&config.remote.base_url, config.remote.api_key.clone()).unwrap(),
    );
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        tasks,
        Arc::new(ArtifactFetcher::new()),
        store.clone(),
        Arc::new(config.pipeline.clone()),
    ));

    let state = AppState {
        store: store.clone(),
        orchestrator,
        config: Arc::new(config),
    };

    TestApp {
        router: build_app_router(state),
        store,
        artifact_path,
        workdir,
    }
}

/// Script configuration rooted at `dir`, running `sh run.sh`.
pub fn shell_scripts(dir: PathBuf) -> ScriptConfig {
    ScriptConfig {
        dir,
        interpreter: "sh".to_string(),
        script_name: "run.sh".to_string(),
        timeout: Duration::from_secs(10),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a multipart form with one file field.
pub async fn post_file(
    app: Router,
    uri: &str,
    field: &str,
    filename: &str,
    bytes: &[u8],
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, filename, bytes)))
        .unwrap();
    send(app, request).await
}

/// Encode a single-file multipart body.
pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
