//! Error types for Penchant

use thiserror::Error;

use crate::models::ProductId;

/// Result alias used across the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for store and backend operations
#[derive(Error, Debug)]
pub enum Error {
    /// The remote service answered with a failure
    #[error("{message}")]
    Service {
        /// HTTP status, when the failure came over the wire
        status: Option<u16>,
        /// Message reported by the service
        message: String,
    },

    /// The request never got a usable answer
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No user is signed in
    #[error("Not signed in. Please log in again.")]
    NotSignedIn,

    /// The signed-in user does not own the product
    #[error("Only the owner can edit this product.")]
    NotOwner,

    /// No product with this id in the current snapshot
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Input rejected before reaching the service
    #[error("{0}")]
    Invalid(String),

    /// Image bytes could not be used
    #[error("Image error: {0}")]
    Image(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a service failure with a message
    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Failure detected client-side before any write (not signed in, not owner)
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::NotSignedIn | Self::NotOwner)
    }

    /// Input rejected before any network call
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::Image(_))
    }
}
