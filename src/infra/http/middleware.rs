//! Request correlation and response logging for the page service.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::domain::pages::PageId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const METRIC_HTTP_RESPONSES: &str = "mdpage_http_responses_total";

/// Route label for requests that fell through to the 404 fallback.
const UNMATCHED_ROUTE: &str = "unmatched";

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
}

/// Reuse a caller-supplied request id when it is short printable ASCII,
/// otherwise mint one. The id is echoed back on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| is_acceptable_request_id(value))
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Count every response by route and status, and log failures with the
/// attached error report. Page lookups also log the page id they asked for.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    counter!(
        METRIC_HTTP_RESPONSES,
        "route" => route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let elapsed_ms = start.elapsed().as_millis();
    let page_id = page_id_from_path(&path)
        .map(|id| id.to_string())
        .unwrap_or_default();
    let report = response.extensions_mut().remove::<ErrorReport>();
    let (source, messages) = match report {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());

    if status.is_server_error() {
        error!(
            target = "mdpage::http::response",
            status = status.as_u16(),
            method = %method,
            route = %route,
            path = %path,
            page_id = %page_id,
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            chain = ?messages,
            request_id = %request_id,
            "request failed",
        );
    } else {
        warn!(
            target = "mdpage::http::response",
            status = status.as_u16(),
            method = %method,
            route = %route,
            path = %path,
            page_id = %page_id,
            elapsed_ms = elapsed_ms,
            source = source,
            detail = %detail,
            request_id = %request_id,
            "client request error",
        );
    }

    response
}

/// Page id addressed by a `/<id>.html` path, if the path is one.
pub fn page_id_from_path(path: &str) -> Option<PageId> {
    let file = path.strip_prefix('/')?;
    if file.contains('/') {
        return None;
    }
    PageId::from_file_name(file)
}

fn is_acceptable_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}
