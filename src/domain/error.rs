use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid timestamp `{value}`")]
    InvalidTimestamp { value: String },
}

impl DomainError {
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
        }
    }
}
