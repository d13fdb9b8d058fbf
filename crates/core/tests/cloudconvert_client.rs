//! CloudConvert client integration tests against a local stub of the v2 API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;

use convertino_core::{
    testing::fixtures, ClientError, CloudConvertClient, CloudConvertConfig, ConversionClient,
    ConversionOptions, ImportMethod, RemoteJob,
};

const API_KEY: &str = "test-key";
const SANDBOX_KEY: &str = "sandbox-key";
const RESULT: &[u8] = b"%PDF-1.4 stub result";

#[derive(Default)]
struct Stub {
    base: String,
    /// Body of the last `POST /jobs`.
    payload: Mutex<Option<Value>>,
    /// Last bearer token seen on the API routes.
    token: Mutex<Option<String>>,
    /// Uploaded multipart fields, in order.
    uploaded: Mutex<Vec<(String, Vec<u8>)>>,
    polls: AtomicUsize,
    /// Status reported once polling completes.
    final_status: Mutex<&'static str>,
    /// Whether the finished export task carries a URL.
    with_export_url: Mutex<bool>,
    /// Makes the export URL hang instead of answering.
    stall_download: Mutex<Option<Stall>>,
}

#[derive(Clone, Copy)]
enum Stall {
    /// Never sends response headers.
    Headers,
    /// Sends the first chunk, then nothing.
    Body,
}

type Shared = Arc<Stub>;

fn authorized(stub: &Stub, headers: &HeaderMap) -> bool {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let ok = matches!(token.as_deref(), Some(API_KEY) | Some(SANDBOX_KEY));
    *stub.token.lock().unwrap() = token;
    ok
}

fn unauthenticated() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthenticated.", "code": "UNAUTHENTICATED"})),
    )
        .into_response()
}

async fn create_job(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> axum::response::Response {
    if !authorized(&stub, &headers) {
        return unauthenticated();
    }
    let upload = payload["tasks"]["import-file"]["operation"] == "import/upload";
    *stub.payload.lock().unwrap() = Some(payload);

    let import = if upload {
        json!({
            "name": "import-file",
            "operation": "import/upload",
            "status": "waiting",
            "result": {"form": {
                "url": format!("{}/upload", stub.base),
                "parameters": {"expires": 1700000000, "signature": "sig"}
            }}
        })
    } else {
        json!({"name": "import-file", "operation": "import/base64", "status": "waiting"})
    };

    (
        StatusCode::CREATED,
        Json(json!({"data": {"id": "job-1", "status": "waiting", "tasks": [import]}})),
    )
        .into_response()
}

async fn get_job(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> axum::response::Response {
    if !authorized(&stub, &headers) {
        return unauthenticated();
    }
    if stub.polls.fetch_add(1, Ordering::SeqCst) == 0 {
        return Json(json!({"data": {"id": id, "status": "processing", "tasks": []}}))
            .into_response();
    }

    let status = *stub.final_status.lock().unwrap();
    let body = if status == "error" {
        json!({"data": {"id": id, "status": "error", "tasks": [
            {"name": "convert-file", "operation": "convert", "status": "error",
             "message": "Unsupported output format"}
        ]}})
    } else {
        let files = if *stub.with_export_url.lock().unwrap() {
            json!([{"filename": "report.pdf", "url": format!("{}/files/report.pdf", stub.base)}])
        } else {
            json!([])
        };
        json!({"data": {"id": id, "status": "finished", "tasks": [
            {"name": "convert-file", "operation": "convert", "status": "finished"},
            {"name": "export-file", "operation": "export/url", "status": "finished",
             "result": {"files": files}}
        ]}})
    };
    Json(body).into_response()
}

async fn upload(State(stub): State<Shared>, mut multipart: Multipart) -> StatusCode {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap_or_default().to_vec();
        stub.uploaded.lock().unwrap().push((name, data));
    }
    StatusCode::CREATED
}

async fn download(State(stub): State<Shared>) -> axum::response::Response {
    let stall = *stub.stall_download.lock().unwrap();
    match stall {
        None => RESULT.into_response(),
        Some(Stall::Headers) => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            RESULT.into_response()
        }
        Some(Stall::Body) => {
            let first = futures::stream::once(async {
                Ok::<_, std::io::Error>(Bytes::from_static(&RESULT[..4]))
            });
            Body::from_stream(first.chain(futures::stream::pending())).into_response()
        }
    }
}

async fn users_me(State(stub): State<Shared>, headers: HeaderMap) -> axum::response::Response {
    if !authorized(&stub, &headers) {
        return unauthenticated();
    }
    Json(json!({"data": {
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "credits": 42,
        "created_at": "2024-01-01T00:00:00+00:00"
    }}))
    .into_response()
}

async fn spawn_stub() -> Shared {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let stub = Arc::new(Stub {
        base: format!("http://{}", addr),
        final_status: Mutex::new("finished"),
        with_export_url: Mutex::new(true),
        ..Default::default()
    });

    let app = Router::new()
        .route("/v2/jobs", post(create_job))
        .route("/v2/jobs/{id}", get(get_job))
        .route("/v2/users/me", get(users_me))
        .route("/upload", post(upload))
        .route("/files/report.pdf", get(download))
        .with_state(stub.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    stub
}

fn client(stub: &Stub, import_method: ImportMethod, api_key: &str) -> CloudConvertClient {
    let mut config =
        CloudConvertConfig::with_api_key(api_key).with_base_url(format!("{}/v2", stub.base));
    config.sandbox_api_key = Some(SANDBOX_KEY.to_string());
    config.import_method = import_method;
    config.poll_interval_ms = 10;
    config.timeout_secs = 5;
    CloudConvertClient::new(config).unwrap()
}

fn job(source: PathBuf) -> RemoteJob {
    RemoteJob {
        source,
        output_format: "pdf".to_string(),
        options: ConversionOptions::new().with("page_range", "1-2"),
        sandbox: false,
    }
}

async fn collect(client: &CloudConvertClient, job: RemoteJob) -> Result<Vec<u8>, ClientError> {
    let mut stream = client.convert(job).await?;
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}

#[tokio::test]
async fn test_base64_job_roundtrip() {
    let stub = spawn_stub().await;
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let bytes = collect(&client(&stub, ImportMethod::Base64, API_KEY), job(source))
        .await
        .unwrap();

    assert_eq!(bytes, RESULT);
    assert!(stub.polls.load(Ordering::SeqCst) >= 2);

    let payload = stub.payload.lock().unwrap().clone().unwrap();
    assert_eq!(payload["tag"], "convertino");
    let import = &payload["tasks"]["import-file"];
    assert_eq!(import["operation"], "import/base64");
    assert_eq!(import["filename"], "report.docx");
    // base64 of "source document report.docx"
    assert_eq!(import["file"], "c291cmNlIGRvY3VtZW50IHJlcG9ydC5kb2N4");
    let convert = &payload["tasks"]["convert-file"];
    assert_eq!(convert["output_format"], "pdf");
    assert_eq!(convert["input"], "import-file");
    assert_eq!(convert["page_range"], "1-2");
    assert_eq!(payload["tasks"]["export-file"]["operation"], "export/url");
}

#[tokio::test]
async fn test_upload_job_posts_form() {
    let stub = spawn_stub().await;
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let bytes = collect(&client(&stub, ImportMethod::Upload, API_KEY), job(source))
        .await
        .unwrap();
    assert_eq!(bytes, RESULT);

    let uploaded = stub.uploaded.lock().unwrap().clone();
    let names: Vec<_> = uploaded.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["expires", "signature", "file"]);
    assert_eq!(uploaded[0].1, b"1700000000");
    assert_eq!(uploaded[2].1, b"source document report.docx");
}

#[tokio::test]
async fn test_failed_job() {
    let stub = spawn_stub().await;
    *stub.final_status.lock().unwrap() = "error";
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let err = collect(&client(&stub, ImportMethod::Base64, API_KEY), job(source))
        .await
        .unwrap_err();

    match err {
        ClientError::JobFailed { job_id, reason } => {
            assert_eq!(job_id, "job-1");
            assert!(reason.contains("Unsupported output format"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_finished_without_export_url() {
    let stub = spawn_stub().await;
    *stub.with_export_url.lock().unwrap() = false;
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let err = collect(&client(&stub, ImportMethod::Base64, API_KEY), job(source))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NoExportUrl { .. }));
}

#[tokio::test]
async fn test_bad_key_is_authentication_failure() {
    let stub = spawn_stub().await;
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let err = collect(&client(&stub, ImportMethod::Base64, "wrong"), job(source))
        .await
        .unwrap_err();

    match err {
        ClientError::AuthenticationFailed(message) => assert_eq!(message, "Unauthenticated."),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_sandbox_uses_sandbox_key() {
    let stub = spawn_stub().await;
    let dir = TempDir::new().unwrap();
    let mut remote = job(fixtures::source_file(dir.path(), "report.docx"));
    remote.sandbox = true;

    collect(&client(&stub, ImportMethod::Base64, API_KEY), remote)
        .await
        .unwrap();

    assert_eq!(stub.token.lock().unwrap().as_deref(), Some(SANDBOX_KEY));
}

#[tokio::test]
async fn test_current_user() {
    let stub = spawn_stub().await;
    let account = client(&stub, ImportMethod::Base64, API_KEY)
        .current_user(false)
        .await
        .unwrap();

    assert_eq!(account.username, "alice");
    assert_eq!(account.email, "alice@example.com");
    assert_eq!(account.credits, 42);

    let err = client(&stub, ImportMethod::Base64, "wrong")
        .current_user(false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let config = CloudConvertConfig::with_api_key(API_KEY).with_base_url("http://127.0.0.1:9/v2");
    let client = CloudConvertClient::new(config).unwrap();

    let err = client.current_user(false).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_stalled_download_times_out() {
    let stub = spawn_stub().await;
    *stub.stall_download.lock().unwrap() = Some(Stall::Headers);
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let client = CloudConvertClient::new(CloudConvertConfig {
        timeout_secs: 1,
        ..client(&stub, ImportMethod::Base64, API_KEY).config().clone()
    })
    .unwrap();

    let started = std::time::Instant::now();
    let err = collect(&client, job(source)).await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[tokio::test]
async fn test_stalled_download_body_times_out() {
    let stub = spawn_stub().await;
    *stub.stall_download.lock().unwrap() = Some(Stall::Body);
    let dir = TempDir::new().unwrap();
    let source = fixtures::source_file(dir.path(), "report.docx");

    let client = CloudConvertClient::new(CloudConvertConfig {
        timeout_secs: 1,
        ..client(&stub, ImportMethod::Base64, API_KEY).config().clone()
    })
    .unwrap();

    let started = std::time::Instant::now();
    let err = collect(&client, job(source)).await.unwrap_err();

    assert!(err.is_retryable(), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(30));
}
