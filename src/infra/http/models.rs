use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::application::publish::PublishedPage;
use crate::domain::pages::{PageId, PageSummary};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub url: String,
}

impl From<PublishedPage> for UploadResponse {
    fn from(page: PublishedPage) -> Self {
        Self {
            message: "File converted successfully",
            url: page.url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: PageId,
    pub created_at: String,
    pub size: u64,
}

impl TryFrom<&PageSummary> for FileEntry {
    type Error = time::error::Format;

    fn try_from(summary: &PageSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            id: summary.id,
            created_at: summary.created_at.format(&Rfc3339)?,
            size: summary.size_bytes,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
