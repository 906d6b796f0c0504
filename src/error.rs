//! Client-visible failures of a lookup request and their HTTP mapping.
//!
//! Cache failures never appear here; they are logged where they happen and
//! the request carries on as if the cache had missed.

use thiserror::Error;

use crate::http::{FormError, Response, StatusCode};
use crate::record::MapError;
use crate::upstream::UpstreamError;

/// Everything that can end a lookup request early.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid form: {0}")]
    InvalidForm(#[from] FormError),

    #[error("invalid item id: {0}")]
    MissingItemId(String),

    #[error("failed to get item information: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("failed to get item from response: {0}")]
    Mapping(#[from] MapError),

    #[error("failed to marshal item to json: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidForm(_) | Self::MissingItemId(_) => StatusCode::BadRequest,
            Self::Upstream(_) | Self::Mapping(_) | Self::Serialization(_) => {
                StatusCode::InternalServerError
            }
        }
    }

    /// A complete plain-text error response; no partial success body is ever mixed in.
    pub fn into_response(self) -> Response {
        Response::text(self.status(), self.to_string())
    }
}
