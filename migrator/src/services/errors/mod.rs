use thiserror::Error;

use crate::migration::types::KindTag;
use crate::services::client::ClientError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Platform request failed: {0}")]
    Client(#[from] ClientError),

    #[error("Listing {kind} failed at offset {offset}: {source}")]
    Enumeration {
        kind: KindTag,
        offset: usize,
        #[source]
        source: ClientError,
    },

    #[error("Unexpected {kind} response: {message}")]
    InvalidResponse { kind: KindTag, message: String },

    #[error("Template error in {template}: unknown placeholder {{{placeholder}}}")]
    Template {
        template: String,
        placeholder: String,
    },

    #[error("Configuration error: {field} = {value:?}")]
    Configuration { field: String, value: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Kind {kind} is registered twice")]
    DuplicateKind { kind: KindTag },

    #[error("Audit append of {records} records failed: {message}")]
    AuditWrite { records: usize, message: String },
}

pub type MigrationResult<T> = Result<T, MigrationError>;

impl MigrationError {
    /// Failures a later re-run of the same migration may get past
    pub fn is_temporary(&self) -> bool {
        match self {
            MigrationError::Client(source) | MigrationError::Enumeration { source, .. } => {
                source.is_retryable()
            }
            MigrationError::AuditWrite { .. } => true,
            _ => false,
        }
    }
}
