//! Published page identity and metadata.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use serde::{Serialize, Serializer};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Length of the textual page identifier (a UUID in simple form).
pub const PAGE_ID_LEN: usize = 32;

/// Extension of every persisted page file.
pub const PAGE_FILE_EXTENSION: &str = "html";

/// Opaque, URL-safe identifier of a published page.
///
/// Rendered as 32 lowercase hexadecimal characters. Only the canonical
/// lowercase form parses, so one page never answers to two spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Uuid);

impl PageId {
    /// Build an identifier from 128 random bits, stamping UUIDv4 version bits.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Parse the canonical textual form.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let canonical = value.len() == PAGE_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(DomainError::invalid_page_id(value));
        }

        Uuid::try_parse(value)
            .map(Self)
            .map_err(|_| DomainError::invalid_page_id(value))
    }

    /// Recover an identifier from a persisted file name such as `<id>.html`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name
            .strip_suffix(PAGE_FILE_EXTENSION)
            .and_then(|rest| rest.strip_suffix('.'))?;
        Self::parse(stem).ok()
    }

    pub fn file_name(&self) -> String {
        format!("{self}.{PAGE_FILE_EXTENSION}")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for PageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One immutable published HTML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub html: Bytes,
    pub created_at: OffsetDateTime,
}

impl Page {
    pub fn new(id: PageId, html: Bytes, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            html,
            created_at,
        }
    }

    /// Byte length of the persisted document.
    pub fn size_bytes(&self) -> u64 {
        self.html.len() as u64
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            id: self.id,
            created_at: self.created_at,
            size_bytes: self.size_bytes(),
        }
    }
}

/// Listing metadata for a stored page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSummary {
    pub id: PageId,
    pub created_at: OffsetDateTime,
    pub size_bytes: u64,
}
