//! HTTP surface: upload, listing, page retrieval and health.

pub mod error;
mod handlers;
pub mod middleware;
pub mod models;
mod multipart;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::{listing::ListingService, publish::PublishService, repos::PageStore};

pub use multipart::FILE_FIELD;

#[derive(Clone)]
pub struct HttpState {
    pub publish: Arc<PublishService>,
    pub listing: Arc<ListingService>,
    pub store: Arc<dyn PageStore>,
    pub upload_limit_bytes: u64,
}

pub fn build_router(state: HttpState) -> Router {
    let body_limit = usize::try_from(state.upload_limit_bytes).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(handlers::list_files))
        .route("/health", get(handlers::health))
        .route("/{file}", get(handlers::serve_page))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
