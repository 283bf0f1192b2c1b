//! Page identifier allocation.

use thiserror::Error;

use crate::domain::pages::PageId;

#[derive(Debug, Error)]
#[error("identifier allocator unavailable: {message}")]
pub struct AllocatorError {
    message: String,
}

impl AllocatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait IdAllocator: Send + Sync {
    fn allocate(&self) -> Result<PageId, AllocatorError>;
}

/// Draws 128 bits from the operating system entropy source per identifier.
///
/// Collisions are negligible at any realistic page count (122 random bits
/// after the UUID version and variant are stamped).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdAllocator;

impl IdAllocator for RandomIdAllocator {
    fn allocate(&self) -> Result<PageId, AllocatorError> {
        let mut bytes = [0u8; 16];
        getrandom::fill(&mut bytes).map_err(|err| AllocatorError::new(err.to_string()))?;
        Ok(PageId::from_random_bytes(bytes))
    }
}
