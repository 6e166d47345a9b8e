use thiserror::Error;

/// Failures of the storage-free checks on category and product attributes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("parent_id: maximum category depth of {max} exceeded (level {level})")]
    DepthExceeded { level: i32, max: i32 },
}

impl DomainError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Request field the error is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidField { field, .. } => field,
            Self::DepthExceeded { .. } => "parent_id",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidField { .. } => "invalid",
            Self::DepthExceeded { .. } => "max_depth",
        }
    }
}
