use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid page identifier `{value}`")]
    InvalidPageId { value: String },
}

impl DomainError {
    pub fn invalid_page_id(value: impl Into<String>) -> Self {
        Self::InvalidPageId {
            value: value.into(),
        }
    }
}
