//! Upload acceptance rules.
//!
//! Validation only looks at the declared metadata and whether any bytes
//! arrived at all. Markdown has no invalid form, so payload content is never
//! inspected here.

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;

/// Canonical media type for Markdown documents (RFC 7763).
pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";

/// Recognised file extension, compared case-insensitively.
pub const MARKDOWN_EXTENSION: &str = "md";

const MARKDOWN_MEDIA_TYPES: &[&str] = &[MARKDOWN_MEDIA_TYPE, "text/x-markdown"];

/// A candidate upload as received from a client. Never persisted.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn validate(&self) -> Result<(), UploadRejection> {
        validate(&self.filename, &self.content_type, &self.bytes)
    }
}

/// Reasons an upload is refused before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Only Markdown (.md) files are allowed")]
    UnsupportedFileType,
}

impl UploadRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadRejection::MissingFile => "missing_file",
            UploadRejection::UnsupportedFileType => "unsupported_file_type",
        }
    }
}

/// Accept the upload when it has bytes and either its declared type or its
/// file name marks it as Markdown.
pub fn validate(filename: &str, content_type: &str, bytes: &[u8]) -> Result<(), UploadRejection> {
    if bytes.is_empty() {
        return Err(UploadRejection::MissingFile);
    }

    if is_markdown_media_type(content_type) || has_markdown_extension(filename) {
        Ok(())
    } else {
        Err(UploadRejection::UnsupportedFileType)
    }
}

/// Compare the media type essence, ignoring parameters such as `charset`.
pub fn is_markdown_media_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    MARKDOWN_MEDIA_TYPES
        .iter()
        .any(|known| essence.eq_ignore_ascii_case(known))
}

pub fn has_markdown_extension(filename: &str) -> bool {
    Path::new(filename.trim())
        .extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
}

/// Media type implied by a file name, for callers that only have a path.
pub fn media_type_for(filename: &str) -> Option<&'static str> {
    has_markdown_extension(filename).then_some(MARKDOWN_MEDIA_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_markdown_extension_regardless_of_type() {
        assert_eq!(validate("notes.md", "application/octet-stream", b"# hi"), Ok(()));
        assert_eq!(validate("README.MD", "", b"x"), Ok(()));
    }

    #[test]
    fn accepts_markdown_media_type_regardless_of_name() {
        assert_eq!(validate("upload.bin", "text/markdown", b"x"), Ok(()));
        assert_eq!(
            validate("notes", "Text/Markdown; charset=UTF-8", b"x"),
            Ok(())
        );
        assert_eq!(validate("notes", "text/x-markdown", b"x"), Ok(()));
    }

    #[test]
    fn rejects_other_files() {
        assert_eq!(
            validate("notes.txt", "text/plain", b"hello"),
            Err(UploadRejection::UnsupportedFileType)
        );
        assert_eq!(
            validate("notes.md.txt", "text/plain", b"hello"),
            Err(UploadRejection::UnsupportedFileType)
        );
        assert_eq!(
            validate("markdown", "text/markdownish", b"hello"),
            Err(UploadRejection::UnsupportedFileType)
        );
    }

    #[test]
    fn empty_payload_is_missing_file_even_for_markdown() {
        assert_eq!(
            validate("notes.md", MARKDOWN_MEDIA_TYPE, b""),
            Err(UploadRejection::MissingFile)
        );
        assert_eq!(
            validate("notes.txt", "text/plain", b""),
            Err(UploadRejection::MissingFile)
        );
    }

    #[test]
    fn media_type_follows_markdown_extension() {
        assert_eq!(media_type_for("notes.md"), Some(MARKDOWN_MEDIA_TYPE));
        assert_eq!(media_type_for("docs/README.MD"), Some(MARKDOWN_MEDIA_TYPE));
        assert_eq!(media_type_for("notes.txt"), None);
        assert_eq!(media_type_for("md"), None);
    }

    #[test]
    fn request_validates_its_own_fields() {
        let request = UploadRequest::new("a.md", "text/plain", Bytes::from_static(b"body"));
        assert!(request.validate().is_ok());
    }
}
