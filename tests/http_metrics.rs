use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use mdpage::application::{
    ids::RandomIdAllocator, listing::ListingService, publish::PublishService,
    render::ComrakRenderService, repos::PageStore,
};
use mdpage::infra::{
    http::{HttpState, build_router, middleware::METRIC_HTTP_RESPONSES},
    storage::FsPageStore,
};
use metrics_util::debugging::DebuggingRecorder;
use tempfile::TempDir;
use tower::ServiceExt;

#[tokio::test]
async fn responses_are_counted_by_route_and_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let dir = TempDir::new().expect("temp dir");
    let store: Arc<dyn PageStore> =
        Arc::new(FsPageStore::new(dir.path().to_path_buf()).expect("store"));
    let router = build_router(HttpState {
        publish: Arc::new(PublishService::new(
            Arc::new(ComrakRenderService::default()),
            Arc::new(RandomIdAllocator),
            store.clone(),
            "http://localhost:3000",
        )),
        listing: Arc::new(ListingService::new(store.clone())),
        store,
        upload_limit_bytes: 1024,
    });

    for (uri, expected) in [
        ("/health", StatusCode::OK),
        ("/0123456789abcdef0123456789abcdef.html", StatusCode::NOT_FOUND),
    ] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), expected, "{uri}");
    }

    let labels: Vec<(String, String)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(composite_key, _, _, _)| composite_key.key().name() == METRIC_HTTP_RESPONSES)
        .map(|(composite_key, _, _, _)| {
            let label = |name: &str| {
                composite_key
                    .key()
                    .labels()
                    .find(|label| label.key() == name)
                    .map(|label| label.value().to_string())
                    .unwrap_or_default()
            };
            (label("route"), label("status"))
        })
        .collect();

    for expected in [("/health", "200"), ("/{file}", "404")] {
        assert!(
            labels
                .iter()
                .any(|(route, status)| route == expected.0 && status == expected.1),
            "missing {expected:?} in {labels:?}"
        );
    }
}
