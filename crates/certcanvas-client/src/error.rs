//! Client errors.

use certcanvas_core::storage::StoreError;
use thiserror::Error;

/// Errors from the certificate backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The envelope came back with `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    /// Map onto the storage error vocabulary. `id` names the design.
    pub fn into_store_error(self, id: &str) -> StoreError {
        match self {
            e if e.is_not_found() => StoreError::NotFound(id.to_string()),
            ApiError::Transport(e) => StoreError::Transport(e.to_string()),
            ApiError::Status { status, message } => {
                StoreError::Transport(format!("HTTP {status}: {message}"))
            }
            ApiError::Rejected(message) => StoreError::Rejected(message),
            ApiError::Decode(message) => StoreError::Serialization(message),
            ApiError::Config(message) => StoreError::Other(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let not_found = ApiError::Status {
            status: 404,
            message: "Certificate not found".into(),
        };
        assert!(matches!(
            not_found.into_store_error("abc"),
            StoreError::NotFound(id) if id == "abc"
        ));
        assert!(matches!(
            ApiError::Rejected("locked".into()).into_store_error("abc"),
            StoreError::Rejected(_)
        ));
        assert!(matches!(
            ApiError::Decode("bad".into()).into_store_error("abc"),
            StoreError::Serialization(_)
        ));
    }
}
