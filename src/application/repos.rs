//! Persistence seam for published pages.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::pages::{Page, PageId, PageSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page `{id}` already exists")]
    DuplicateId { id: PageId },
    #[error("page not found")]
    NotFound,
    #[error("page store unavailable: {message}")]
    Unavailable { message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Durable key-value storage for immutable pages.
///
/// `put` must be all-or-nothing and must never replace an existing page.
/// Reads observe every write that completed earlier in the same process.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn put(
        &self,
        id: PageId,
        html: Bytes,
        created_at: OffsetDateTime,
    ) -> Result<Page, StoreError>;

    async fn get(&self, id: PageId) -> Result<Bytes, StoreError>;

    /// Every stored page, ordered by creation time then identifier.
    async fn list(&self) -> Result<Vec<PageSummary>, StoreError>;
}
