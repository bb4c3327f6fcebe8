use std::fmt;

use super::types::HttpMethod;

/// Platform transport errors
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Request never produced a response (connect failure, timeout, reset)
    NetworkError {
        message: String,
    },
    /// Platform answered with a non-success status
    RequestFailed {
        method: HttpMethod,
        path: String,
        status: u16,
        body: String,
    },
    /// Response body could not be decoded
    SerializationError {
        message: String,
    },
    /// Response decoded but did not have the expected shape
    InvalidResponse {
        expected: String,
        got: String,
    },
    /// Client could not be constructed from the given settings
    InvalidConfig {
        message: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            ClientError::RequestFailed {
                method,
                path,
                status,
                body,
            } => {
                write!(f, "{} {} failed with status {}: {}", method, path, status, body)
            }
            ClientError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
            ClientError::InvalidResponse { expected, got } => {
                write!(f, "Invalid response format: expected {}, got {}", expected, got)
            }
            ClientError::InvalidConfig { message } => {
                write!(f, "Invalid client configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::SerializationError {
            message: err.to_string(),
        }
    }
}

impl ClientError {
    /// HTTP status of a failed request, if the platform answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transient failures worth another attempt: network trouble, throttling, 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::NetworkError { .. } => true,
            ClientError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
