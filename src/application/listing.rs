//! Enumerates published pages straight from the store.

use std::sync::Arc;

use thiserror::Error;
use tracing::error;

use crate::application::repos::{PageStore, StoreError};
use crate::domain::pages::PageSummary;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("page store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn PageStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    pub async fn list_published(&self) -> Result<Vec<PageSummary>, ListingError> {
        self.store.list().await.map_err(|err| {
            error!(target = "mdpage::listing", error = %err, "failed to list pages");
            ListingError::StoreUnavailable(err)
        })
    }
}
