//! ROS2 rosbag API end-to-end tests.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use futures::StreamExt;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use ros2_rosbag_uploader::rosbag::AcceptedExtensions;
use ros2_rosbag_uploader::rosbag::RosbagRecord;
use ros2_rosbag_uploader::rosbag::UploadFileInfo;
use ros2_rosbag_uploader::server::api::AppState;
use ros2_rosbag_uploader::server::processing::HttpProcessingService;
use ros2_rosbag_uploader::server::processing::NoopProcessingService;
use ros2_rosbag_uploader::server::processing::ProcessingError;
use ros2_rosbag_uploader::server::processing::ProcessingService;
use ros2_rosbag_uploader::server::repository::InMemoryRosbagRepository;
use ros2_rosbag_uploader::server::repository::RosbagRepository;
use ros2_rosbag_uploader::server::router::create_router;
use ros2_rosbag_uploader::store::LocalBucket;
use serde_json::json;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

const BOUNDARY: &str = "rosbag-test-boundary";
const BUCKET: &str = "rosbags";

/// Create a test server backed by a temporary bucket directory.
async fn create_test_server(max_upload_size: u64) -> (axum::Router, TempDir) {
    create_test_server_with(max_upload_size, Arc::new(NoopProcessingService)).await
}

async fn create_test_server_with(
    max_upload_size: u64,
    processing: Arc<dyn ProcessingService>,
) -> (axum::Router, TempDir) {
    let repository = Arc::new(InMemoryRosbagRepository::new());
    create_test_server_from(max_upload_size, repository, processing).await
}

async fn create_test_server_from(
    max_upload_size: u64,
    repository: Arc<InMemoryRosbagRepository>,
    processing: Arc<dyn ProcessingService>,
) -> (axum::Router, TempDir) {
    let temp = TempDir::new().unwrap();
    let bucket = LocalBucket::open(BUCKET, temp.path().join("bucket"), 2)
        .await
        .unwrap();

    let state = AppState {
        repository,
        bucket: Arc::new(bucket),
        processing,
        accepted_extensions: AcceptedExtensions::default(),
        max_upload_size,
    };

    (create_router(state, CorsLayer::new()), temp)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a multipart upload with the file list first and one part per file.
fn upload_request(files: &[(&str, &str)]) -> Request<Body> {
    let fields: Vec<Value> = files
        .iter()
        .map(|(name, contents)| json!({ "filename": name, "size": contents.len() }))
        .collect();
    upload_with_fields(Value::Array(fields), files)
}

fn upload_with_fields(fields: Value, files: &[(&str, &str)]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fields\"\r\n\r\n{fields}\r\n"
    );
    for (name, contents) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/ros2-rosbag/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn list_is_empty_initially() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, json) = send(&app, get("/api/ros2-rosbag")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn validate_reports_every_invalid_file() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/validate",
            json!({ "fields": [
                { "filename": "a.mcap", "size": 1 },
                { "filename": "b.txt", "size": 1 },
                { "filename": "c.bag", "size": 1 },
            ]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errCode"], 400);
    assert_eq!(
        json["errMsg"],
        "Invalid files (only accept mcap files): b.txt; Invalid files (only accept mcap files): c.bag"
    );
}

#[tokio::test]
async fn validate_rejects_missing_file_list() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, json) = send(&app, post_json("/api/ros2-rosbag/validate", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "ROS2 Rosbag files cannot be empty!");
}

#[tokio::test]
async fn validate_rejects_declared_size_over_limit() {
    let (app, _temp) = create_test_server(16).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/validate",
            json!({ "fields": [{ "filename": "big.mcap", "size": 17 }] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "File size exceeds limit (16 B): big.mcap");
}

#[tokio::test]
async fn upload_stores_objects_and_records() {
    let (app, temp) = create_test_server(1024).await;

    let (status, json) = send(
        &app,
        upload_request(&[("drive.mcap", "hello"), ("lap.mcap", "abc")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Uploaded 2 ROS2 Rosbag files");

    let stored = std::fs::read_to_string(temp.path().join("bucket").join("drive.mcap")).unwrap();
    assert_eq!(stored, "hello");

    let (status, json) = send(&app, get("/api/ros2-rosbag")).await;
    assert_eq!(status, StatusCode::OK);
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record["upload_status"], "COMPLETED");
        assert_eq!(record["filepath"], BUCKET);
    }

    let (status, json) = send(&app, get("/api/ros2-rosbag/objects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            { "original_filename": "drive.mcap", "size": 5, "filepath": BUCKET },
            { "original_filename": "lap.mcap", "size": 3, "filepath": BUCKET },
        ])
    );
}

#[tokio::test]
async fn completed_upload_blocks_a_second_one() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, _) = send(&app, upload_request(&[("drive.mcap", "hello")])).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/validate",
            json!({ "fields": [{ "filename": "drive.mcap", "size": 5 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "ROS2 Rosbag files already exist: drive.mcap");
}

#[tokio::test]
async fn oversized_contents_mark_the_record_failed() {
    let (app, temp) = create_test_server(16).await;

    let too_big = "x".repeat(32);
    let (status, json) = send(&app, upload_request(&[("big.mcap", too_big.as_str())])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "File size exceeds limit (16 B): big.mcap");

    // Declared small, sent large.
    let request = upload_with_fields(
        json!([{ "filename": "big.mcap", "size": 4 }]),
        &[("big.mcap", too_big.as_str())],
    );
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json["errMsg"],
        "Failed to upload ROS2 Rosbag files: big.mcap: File size exceeds limit (16 B)"
    );
    assert!(!temp.path().join("bucket").join("big.mcap").exists());

    let (_, json) = send(&app, get("/api/ros2-rosbag")).await;
    assert_eq!(json[0]["upload_status"], "ERROR");
    assert_eq!(json[0]["upload_error_msg"], "File size exceeds limit (16 B)");

    let (status, json) = send(
        &app,
        post_json("/api/ros2-rosbag/process", json!({ "original_filename": "big.mcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "ROS2 Rosbag file upload is not completed: big.mcap");

    // A failed upload may be retried.
    let (status, _) = send(&app, upload_request(&[("big.mcap", "small")])).await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = send(&app, get("/api/ros2-rosbag")).await;
    assert_eq!(json[0]["upload_status"], "COMPLETED");
    assert_eq!(json[0]["upload_error_msg"], Value::Null);
}

#[tokio::test]
async fn description_update_returns_the_stored_record() {
    let (app, _temp) = create_test_server(1024).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/description",
            json!({ "original_filename": "drive.mcap", "description": "highway run" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "highway run");
    assert_eq!(json["upload_status"], "COMPLETED");
}

#[tokio::test]
async fn description_update_for_unknown_file_is_not_found() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/description",
            json!({ "original_filename": "ghost.mcap", "description": "x" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["errCode"], 404);
}

#[tokio::test]
async fn process_request_lifecycle() {
    let (app, _temp) = create_test_server(1024).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;
    let record = json!({ "original_filename": "drive.mcap" });

    let (status, json) = send(&app, post_json("/api/ros2-rosbag/process", record.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        "Processing request for drive.mcap sent! Click the refresh button to get the latest processing status."
    );

    let (status, _) = send(&app, post_json("/api/ros2-rosbag/process", record)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/process/status",
            json!({ "original_filename": "drive.mcap", "process_status": "completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["process_status"], "COMPLETED");
}

#[tokio::test]
async fn process_request_for_unknown_file_is_not_found() {
    let (app, _temp) = create_test_server(1024).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/process",
            json!({ "original_filename": "ghost.mcap" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["errMsg"], "ROS2 Rosbag not found: ghost.mcap");
}

#[tokio::test]
async fn status_report_rejects_na() {
    let (app, _temp) = create_test_server(1024).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/ros2-rosbag/process/status",
            json!({ "original_filename": "drive.mcap", "process_status": "NA" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn processing_service_failure_is_a_bad_gateway() {
    let service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&service)
        .await;

    let processing = Arc::new(HttpProcessingService::new(format!("{}/jobs", service.uri())));
    let (app, _temp) = create_test_server_with(1024, processing).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;

    let (status, json) = send(
        &app,
        post_json("/api/ros2-rosbag/process", json!({ "original_filename": "drive.mcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        json["errMsg"],
        "processing service rejected the request (503): busy"
    );

    let (_, json) = send(&app, get("/api/ros2-rosbag")).await;
    assert_eq!(json[0]["process_status"], "ERROR");
}

#[tokio::test]
async fn processing_service_response_is_returned() {
    let service = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(202).set_body_string("job 42 queued"))
        .mount(&service)
        .await;

    let processing = Arc::new(HttpProcessingService::new(format!("{}/jobs", service.uri())));
    let (app, _temp) = create_test_server_with(1024, processing).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;

    let (status, json) = send(
        &app,
        post_json("/api/ros2-rosbag/process", json!({ "original_filename": "drive.mcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, "job 42 queued");
}

/// Counts submissions and takes a while to answer.
#[derive(Default)]
struct SlowProcessingService {
    submits: AtomicUsize,
}

#[async_trait]
impl ProcessingService for SlowProcessingService {
    async fn submit(&self, record: &RosbagRecord) -> Result<String, ProcessingError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(format!("queued {}", record.original_filename))
    }
}

/// Reports completion back to the repository before answering.
struct FastProcessingService {
    repository: Arc<InMemoryRosbagRepository>,
}

#[async_trait]
impl ProcessingService for FastProcessingService {
    async fn submit(&self, record: &RosbagRecord) -> Result<String, ProcessingError> {
        self.repository
            .set_process_status(&record.original_filename, "COMPLETED", None)
            .await
            .map_err(|e| ProcessingError::Unreachable(e.to_string()))?;
        Ok(String::from("done"))
    }
}

#[tokio::test]
async fn concurrent_process_requests_submit_once() {
    let processing = Arc::new(SlowProcessingService::default());
    let (app, _temp) = create_test_server_with(1024, processing.clone()).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;
    let record = json!({ "original_filename": "drive.mcap" });

    let ((first, _), (second, _)) = tokio::join!(
        send(&app, post_json("/api/ros2-rosbag/process", record.clone())),
        send(&app, post_json("/api/ros2-rosbag/process", record)),
    );

    let mut statuses = vec![first, second];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(processing.submits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_reported_during_submit_is_kept() {
    let repository = Arc::new(InMemoryRosbagRepository::new());
    let processing = Arc::new(FastProcessingService {
        repository: repository.clone(),
    });
    let (app, _temp) = create_test_server_from(1024, repository.clone(), processing).await;
    send(&app, upload_request(&[("drive.mcap", "hello")])).await;

    let (status, _) = send(
        &app,
        post_json("/api/ros2-rosbag/process", json!({ "original_filename": "drive.mcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = repository.find_by_filename("drive.mcap").await.unwrap().unwrap();
    assert_eq!(stored.process_status.as_deref(), Some("COMPLETED"));
}

#[tokio::test]
async fn process_request_before_upload_completes_is_rejected() {
    let repository = Arc::new(InMemoryRosbagRepository::new());
    let (app, _temp) =
        create_test_server_from(1024, repository.clone(), Arc::new(NoopProcessingService)).await;
    repository
        .begin_upload(&UploadFileInfo::new("drive.mcap", 5), BUCKET)
        .await
        .unwrap();

    let (status, json) = send(
        &app,
        post_json("/api/ros2-rosbag/process", json!({ "original_filename": "drive.mcap" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errMsg"], "ROS2 Rosbag file upload is not completed: drive.mcap");
}

#[tokio::test]
async fn interrupted_upload_can_be_retried() {
    let repository = Arc::new(InMemoryRosbagRepository::new());
    let (app, _temp) =
        create_test_server_from(1024, repository.clone(), Arc::new(NoopProcessingService)).await;

    let head = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fields\"\r\n\r\n[{{\"filename\":\"a.mcap\",\"size\":5}}]\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.mcap\"\r\nContent-Type: application/octet-stream\r\n\r\nhel"
    );
    let stream = futures::stream::iter([Ok::<_, std::io::Error>(head)])
        .chain(futures::stream::pending());
    let request = Request::builder()
        .method("POST")
        .uri("/api/ros2-rosbag/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream))
        .unwrap();

    let stalled = tokio::time::timeout(Duration::from_millis(200), app.clone().oneshot(request)).await;
    assert!(stalled.is_err());

    let mut upload_status = None;
    for _ in 0..50 {
        upload_status = repository
            .find_by_filename("a.mcap")
            .await
            .unwrap()
            .and_then(|record| record.upload_status);
        if upload_status.as_deref() == Some("ERROR") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(upload_status.as_deref(), Some("ERROR"));

    let (status, _) = send(&app, upload_request(&[("a.mcap", "hello")])).await;
    assert_eq!(status, StatusCode::OK);
}
