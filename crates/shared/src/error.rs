use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the routing backend on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("server responded {status}: {detail}")]
pub struct ApiException {
    pub status: u16,
    pub detail: String,
}

impl ApiException {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            detail: value.detail,
        }
    }
}
