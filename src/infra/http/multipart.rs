//! Multipart upload payload parsing.

use axum::body::HttpBody;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{StatusCode, header::CONTENT_LENGTH};
use bytes::Bytes;
use tracing::debug;

use super::error::ApiError;
use crate::domain::uploads::UploadRequest;

const SOURCE: &str = "mdpage::http::multipart";

/// Form field carrying the Markdown document.
pub const FILE_FIELD: &str = "file";

/// Turn an upload request into the candidate document. An empty body or a
/// form without a file part yields an empty candidate, which validation
/// turns into a missing-file rejection.
pub(super) async fn read_upload_request(
    request: Request,
    limit_bytes: u64,
) -> Result<UploadRequest, ApiError> {
    if has_empty_body(&request) {
        debug!(target = SOURCE, "upload body is empty");
        return Ok(empty_upload());
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| ApiError::invalid_multipart(SOURCE, rejection.body_text()))?;
    read_upload_payload(&mut multipart, limit_bytes).await
}

async fn read_upload_payload(
    multipart: &mut Multipart,
    limit_bytes: u64,
) -> Result<UploadRequest, ApiError> {
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let is_file_part = field.name() == Some(FILE_FIELD) || field.file_name().is_some();
                if !is_file_part {
                    continue;
                }

                let filename = field
                    .file_name()
                    .map(|value| value.trim().to_string())
                    .unwrap_or_default();
                let content_type = field
                    .content_type()
                    .map(|value| value.to_string())
                    .unwrap_or_default();

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| classify(err.status(), err.body_text(), limit_bytes))?;

                debug!(
                    target = SOURCE,
                    filename = %filename,
                    content_type = %content_type,
                    size_bytes = bytes.len(),
                    "upload payload received"
                );
                return Ok(UploadRequest::new(filename, content_type, bytes));
            }
            Ok(None) => break,
            Err(err) => return Err(classify(err.status(), err.body_text(), limit_bytes)),
        }
    }

    Ok(empty_upload())
}

fn empty_upload() -> UploadRequest {
    UploadRequest::new(String::new(), String::new(), Bytes::new())
}

fn has_empty_body(request: &Request) -> bool {
    let declared_empty = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0");
    declared_empty || request.body().size_hint().exact() == Some(0)
}

fn classify(status: StatusCode, detail: String, limit_bytes: u64) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(SOURCE, limit_bytes)
    } else {
        ApiError::invalid_multipart(SOURCE, detail)
    }
}
