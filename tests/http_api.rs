use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use mdpage::application::{
    ids::RandomIdAllocator,
    listing::ListingService,
    publish::PublishService,
    render::ComrakRenderService,
    repos::PageStore,
};
use mdpage::infra::{
    http::{FILE_FIELD, HttpState, build_router},
    storage::FsPageStore,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BASE_URL: &str = "http://localhost:3000";
const BOUNDARY: &str = "mdpage-test-boundary";

fn app_with_limit(limit: u64) -> (TempDir, Router) {
    let dir = TempDir::new().expect("temp dir");
    let store: Arc<dyn PageStore> =
        Arc::new(FsPageStore::new(dir.path().join("converted")).expect("store"));

    let publish = Arc::new(PublishService::new(
        Arc::new(ComrakRenderService::default()),
        Arc::new(RandomIdAllocator),
        store.clone(),
        BASE_URL,
    ));
    let listing = Arc::new(ListingService::new(store.clone()));

    let router = build_router(HttpState {
        publish,
        listing,
        store,
        upload_limit_bytes: limit,
    });
    (dir, router)
}

fn app() -> (TempDir, Router) {
    app_with_limit(10 * 1024 * 1024)
}

fn multipart_body(filename: &str, content_type: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{FILE_FIELD}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

async fn upload(app: &Router, filename: &str, content_type: &str, contents: &[u8]) -> Response {
    send(
        app,
        upload_request(multipart_body(filename, content_type, contents)),
    )
    .await
}

fn page_path(url: &str) -> String {
    url.strip_prefix(BASE_URL)
        .expect("url uses configured base")
        .to_string()
}

async fn listed_files(app: &Router) -> Vec<Value> {
    let response = get(app, "/files").await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["files"]
        .as_array()
        .expect("files array")
        .clone()
}

#[tokio::test]
async fn markdown_upload_is_published_and_served() {
    let (_dir, app) = app();

    let response = upload(&app, "hello.md", "text/markdown", b"# Hello\n\nWorld").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "File converted successfully");
    let url = json["url"].as_str().expect("url string").to_string();

    let response = get(&app, &page_path(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert!(
        response.headers()[header::CACHE_CONTROL]
            .to_str()
            .expect("ascii header")
            .contains("immutable")
    );

    let html = String::from_utf8(body_bytes(response).await).expect("utf-8 page");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h1>Hello</h1>"));
    assert!(html.contains("<p>World</p>"));
}

#[tokio::test]
async fn markdown_extension_is_enough_without_media_type() {
    let (_dir, app) = app();

    let response = upload(&app, "README.MD", "application/octet-stream", b"*hi*").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn text_file_is_rejected_and_nothing_is_stored() {
    let (_dir, app) = app();
    let before = listed_files(&app).await.len();

    let response = upload(&app, "notes.txt", "text/plain", b"just text").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Only Markdown (.md) files are allowed"
    );

    assert_eq!(listed_files(&app).await.len(), before);
}

#[tokio::test]
async fn empty_file_is_missing_file() {
    let (_dir, app) = app();

    let response = upload(&app, "empty.md", "text/markdown", b"").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
    assert!(listed_files(&app).await.is_empty());
}

#[tokio::test]
async fn form_without_file_part_is_missing_file() {
    let (_dir, app) = app();

    let body = format!("--{BOUNDARY}--\r\n").into_bytes();
    let response = send(&app, upload_request(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn empty_body_is_missing_file() {
    let (_dir, app) = app();

    let bare = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .body(Body::empty())
        .expect("request should build");
    let response = send(&app, bare).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");

    let response = send(&app, upload_request(Vec::new())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file uploaded");

    assert!(listed_files(&app).await.is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let (_dir, app) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .expect("request should build");
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid multipart form data"
    );
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let (_dir, app) = app_with_limit(1024);

    let response = upload(&app, "big.md", "text/markdown", &[b'a'; 8192]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(listed_files(&app).await.is_empty());
}

#[tokio::test]
async fn repeated_uploads_get_distinct_ids_and_matching_sizes() {
    let (_dir, app) = app();

    let mut urls = Vec::new();
    for _ in 0..5 {
        let response = upload(&app, "same.md", "text/markdown", b"# Same\n\nbody").await;
        assert_eq!(response.status(), StatusCode::OK);
        urls.push(
            body_json(response).await["url"]
                .as_str()
                .expect("url")
                .to_string(),
        );
    }
    assert_eq!(urls.iter().collect::<HashSet<_>>().len(), 5);

    let files = listed_files(&app).await;
    assert_eq!(files.len(), 5);

    for file in &files {
        let id = file["id"].as_str().expect("id string");
        assert_eq!(id.len(), 32);
        assert!(file["createdAt"].is_string());

        let first = body_bytes(get(&app, &format!("/{id}.html")).await).await;
        let second = body_bytes(get(&app, &format!("/{id}.html")).await).await;
        assert_eq!(first, second);
        assert_eq!(file["size"].as_u64(), Some(first.len() as u64));
    }
}

#[tokio::test]
async fn unknown_or_malformed_page_is_not_found() {
    let (_dir, app) = app();

    for uri in [
        "/0123456789abcdef0123456789abcdef.html",
        "/not-an-id.html",
        "/0123456789abcdef0123456789abcdef",
        "/0123456789ABCDEF0123456789ABCDEF.html",
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_json(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let (_dir, app) = app();

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "OK");
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let (_dir, app) = app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("x-request-id", "trace-7f3a")
        .body(Body::empty())
        .expect("request should build");
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "trace-7f3a");
}

#[tokio::test]
async fn listing_is_unavailable_when_directory_vanishes() {
    let (dir, app) = app();
    std::fs::remove_dir_all(dir.path().join("converted")).expect("remove storage");

    let response = get(&app, "/files").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_json(response).await["error"].is_string());
}
