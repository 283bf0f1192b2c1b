use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::{
    error::ErrorReport, listing::ListingError, publish::PublishError, repos::StoreError,
};

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Error returned by an HTTP handler. Clients only see the public message;
/// the report carries the cause chain to the response logger.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    public_message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message: public_message.into(),
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: impl Into<String>,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            public_message: public_message.into(),
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn not_found(source: &'static str) -> Self {
        Self::new(
            source,
            StatusCode::NOT_FOUND,
            "Page not found",
            "no page with that identifier",
        )
    }

    pub fn invalid_multipart(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::BAD_REQUEST,
            "Invalid multipart form data",
            detail,
        )
    }

    pub fn payload_too_large(source: &'static str, limit_bytes: u64) -> Self {
        Self::new(
            source,
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File is too large (limit is {limit_bytes} bytes)"),
            format!("request body exceeded {limit_bytes} bytes"),
        )
    }

    pub fn publish(source: &'static str, error: &PublishError) -> Self {
        match error {
            PublishError::Rejected(rejection) => Self::from_error(
                source,
                StatusCode::BAD_REQUEST,
                rejection.to_string(),
                error,
            ),
            PublishError::ConversionFailed(_) => Self::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error converting file",
                error,
            ),
        }
    }

    pub fn listing(source: &'static str, error: &ListingError) -> Self {
        match error {
            ListingError::StoreUnavailable(_) => Self::from_error(
                source,
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to list files",
                error,
            ),
        }
    }

    pub fn store(source: &'static str, error: &StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::not_found(source),
            _ => Self::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to read page",
                error,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.public_message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::uploads::UploadRejection;

    #[test]
    fn rejections_are_client_errors_with_their_message() {
        let error = PublishError::Rejected(UploadRejection::UnsupportedFileType);
        let api = ApiError::publish("test", &error);
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.public_message, "Only Markdown (.md) files are allowed");
    }

    #[test]
    fn store_outage_on_listing_is_unavailable() {
        let error = ListingError::StoreUnavailable(StoreError::unavailable("gone"));
        let api = ApiError::listing("test", &error);
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(api.report.messages.iter().any(|m| m.contains("gone")));
    }

    #[test]
    fn response_carries_report_extension() {
        let response = ApiError::not_found("test").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
