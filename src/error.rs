use thiserror::Error;

/// Errors surfaced by the metadata pipeline.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("type not found: {0}")]
    TypeNotFound(String),

    #[error("failed to introspect {type_name}: {reason}")]
    Introspection { type_name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn introspection(type_name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Introspection {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_type_not_found(&self) -> bool {
        matches!(self, Self::TypeNotFound(_))
    }
}

pub type Result<T, E = MetadataError> = std::result::Result<T, E>;
