//! Filesystem-backed page storage.
//!
//! Every page lives in `<root>/<id>.html`. Writes go to a temporary file in the
//! same directory and are linked into place with a no-clobber rename, so a page
//! is either fully visible or absent and an existing page is never replaced.
//! The creation timestamp is carried by the file's modification time.

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tokio::fs;
use tracing::debug;

use crate::application::repos::{PageStore, StoreError};
use crate::domain::pages::{Page, PageId, PageSummary};

const TEMP_PREFIX: &str = ".mdpage-";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug)]
pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &PageId) -> PathBuf {
        self.root.join(id.file_name())
    }
}

#[async_trait]
impl PageStore for FsPageStore {
    async fn put(
        &self,
        id: PageId,
        html: Bytes,
        created_at: OffsetDateTime,
    ) -> Result<Page, StoreError> {
        let created_at = truncate_to_millis(created_at);
        let root = self.root.clone();
        let payload = html.clone();

        tokio::task::spawn_blocking(move || write_new_page(&root, id, &payload, created_at))
            .await
            .map_err(|err| StoreError::unavailable(format!("page write task failed: {err}")))??;

        debug!(
            target = "mdpage::storage",
            page_id = %id,
            size_bytes = html.len(),
            "page persisted"
        );

        Ok(Page::new(id, html, created_at))
    }

    async fn get(&self, id: PageId) -> Result<Bytes, StoreError> {
        match fs::read(self.path_for(&id)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    async fn list(&self) -> Result<Vec<PageSummary>, StoreError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|err| {
            StoreError::unavailable(format!("cannot read {}: {err}", self.root.display()))
        })?;

        let mut pages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str().and_then(PageId::from_file_name) else {
                continue;
            };

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(StoreError::Io(err)),
            };
            if !metadata.is_file() {
                continue;
            }

            pages.push(PageSummary {
                id,
                created_at: OffsetDateTime::from(metadata.modified()?),
                size_bytes: metadata.len(),
            });
        }

        pages.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(pages)
    }
}

fn write_new_page(
    root: &Path,
    id: PageId,
    html: &[u8],
    created_at: OffsetDateTime,
) -> Result<(), StoreError> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(root)?;
    file.write_all(html)?;
    file.as_file().set_modified(SystemTime::from(created_at))?;
    file.as_file().sync_all()?;

    match file.persist_noclobber(root.join(id.file_name())) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            Err(StoreError::DuplicateId { id })
        }
        Err(err) => Err(StoreError::Io(err.error)),
    }
}

// Stored with millisecond precision so listings report exactly what `put` returned.
fn truncate_to_millis(timestamp: OffsetDateTime) -> OffsetDateTime {
    timestamp - Duration::nanoseconds(i64::from(timestamp.nanosecond() % 1_000_000))
}
