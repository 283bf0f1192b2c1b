//! End-to-end publish pipeline: validate, render, assemble, allocate, store.

use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::application::{
    ids::{AllocatorError, IdAllocator},
    render::{RenderError, RenderService},
    repos::{PageStore, StoreError},
};
use crate::domain::{
    pages::{Page, PageId},
    uploads::{UploadRejection, UploadRequest},
};
use crate::presentation::document::{AssembleError, PageAssembler};

const SOURCE: &str = "mdpage::publish";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error("conversion failed")]
    ConversionFailed(#[from] ConversionError),
}

/// Cause of a failure after the upload was accepted.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("uploaded markdown is not valid UTF-8")]
    Decode(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    AllocatorUnavailable(#[from] AllocatorError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishedPage {
    pub id: PageId,
    pub url: String,
    pub created_at: OffsetDateTime,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct PublishService {
    renderer: Arc<dyn RenderService>,
    assembler: PageAssembler,
    ids: Arc<dyn IdAllocator>,
    store: Arc<dyn PageStore>,
    public_base_url: String,
}

impl PublishService {
    pub fn new(
        renderer: Arc<dyn RenderService>,
        ids: Arc<dyn IdAllocator>,
        store: Arc<dyn PageStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            renderer,
            assembler: PageAssembler,
            ids,
            store,
            public_base_url,
        }
    }

    /// Externally dereferenceable URL of a page.
    pub fn page_url(&self, id: &PageId) -> String {
        format!("{}/{}", self.public_base_url, id.file_name())
    }

    /// Run the whole pipeline. Rejected uploads have no side effects; the
    /// store write is the only externally visible effect of a success.
    pub async fn publish(&self, request: UploadRequest) -> Result<PublishedPage, PublishError> {
        let started_at = Instant::now();

        if let Err(rejection) = request.validate() {
            counter!("mdpage_publish_rejected_total", "reason" => rejection.as_str())
                .increment(1);
            warn!(
                target = SOURCE,
                filename = %request.filename,
                content_type = %request.content_type,
                reason = rejection.as_str(),
                "upload rejected"
            );
            return Err(rejection.into());
        }

        let page = match self.convert_and_store(&request.bytes).await {
            Ok(page) => page,
            Err(err) => {
                counter!("mdpage_publish_failed_total").increment(1);
                if let ConversionError::Store(StoreError::DuplicateId { id }) = &err {
                    error!(
                        target = SOURCE,
                        page_id = %id,
                        "allocator produced an identifier that already exists; refusing to overwrite"
                    );
                } else {
                    error!(
                        target = SOURCE,
                        filename = %request.filename,
                        error = %err,
                        "conversion failed"
                    );
                }
                return Err(err.into());
            }
        };

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        counter!("mdpage_publish_total").increment(1);
        histogram!("mdpage_publish_ms").record(elapsed_ms);

        let published = PublishedPage {
            id: page.id,
            url: self.page_url(&page.id),
            created_at: page.created_at,
            size_bytes: page.size_bytes(),
        };

        info!(
            target = SOURCE,
            page_id = %published.id,
            filename = %request.filename,
            size_bytes = published.size_bytes,
            elapsed_ms = elapsed_ms as u64,
            "page published"
        );

        Ok(published)
    }

    async fn convert_and_store(&self, bytes: &Bytes) -> Result<Page, ConversionError> {
        let markdown = std::str::from_utf8(bytes)?;
        let fragment = self.renderer.render(markdown)?;
        let document = self.assembler.assemble(&fragment)?;
        let id = self.ids.allocate()?;

        let page = self
            .store
            .put(id, Bytes::from(document), OffsetDateTime::now_utc())
            .await?;
        Ok(page)
    }
}
