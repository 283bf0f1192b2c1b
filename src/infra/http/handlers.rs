use axum::{
    Json,
    extract::{Path, Request, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::{
    HttpState,
    error::ApiError,
    models::{FileEntry, FilesResponse, HealthResponse, UploadResponse},
    multipart::read_upload_request,
};
use crate::domain::pages::PageId;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

pub(super) async fn upload(
    State(state): State<HttpState>,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    const SOURCE: &str = "mdpage::http::upload";

    let candidate = read_upload_request(request, state.upload_limit_bytes).await?;

    let published = state
        .publish
        .publish(candidate)
        .await
        .map_err(|err| ApiError::publish(SOURCE, &err))?;

    Ok(Json(published.into()))
}

pub(super) async fn list_files(
    State(state): State<HttpState>,
) -> Result<Json<FilesResponse>, ApiError> {
    const SOURCE: &str = "mdpage::http::list_files";

    let pages = state
        .listing
        .list_published()
        .await
        .map_err(|err| ApiError::listing(SOURCE, &err))?;

    let files = pages
        .iter()
        .map(FileEntry::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            ApiError::from_error(
                SOURCE,
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to list files",
                &err,
            )
        })?;

    Ok(Json(FilesResponse { files }))
}

pub(super) async fn serve_page(
    State(state): State<HttpState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    const SOURCE: &str = "mdpage::http::serve_page";

    let Some(id) = PageId::from_file_name(&file) else {
        return Err(ApiError::not_found(SOURCE));
    };

    match state.store.get(id).await {
        Ok(html) => Ok((
            [(CONTENT_TYPE, HTML_CONTENT_TYPE), (CACHE_CONTROL, IMMUTABLE_CACHE)],
            html,
        )
            .into_response()),
        Err(err) => {
            let api_error = ApiError::store(SOURCE, &err);
            if api_error.status().is_server_error() {
                error!(
                    target = SOURCE,
                    page_id = %id,
                    error = %err,
                    "failed to read stored page"
                );
            }
            Err(api_error)
        }
    }
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

pub(super) async fn not_found() -> ApiError {
    ApiError::new(
        "mdpage::http::fallback",
        axum::http::StatusCode::NOT_FOUND,
        "Not found",
        "no route matches the request",
    )
}
