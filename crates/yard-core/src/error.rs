//! Error handling for the inventory engine
//!
//! Provides a unified error type and result type shared by the placement
//! engine and the attribute decoders.

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for inventory operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The cluster cannot fit all replicas of the reservation
    #[error("insufficient capacity to place reservation")]
    InsufficientCapacity,

    /// Replicas of the same group resolved to different resources or
    /// scheduler params
    #[error("replicas of the same group resolved to different resources")]
    GroupResourceMismatch,

    /// An attribute list could not be decoded
    #[error("invalid attributes: {0}")]
    InvalidAttributes(String),
}

impl Error {
    /// Create an invalid attributes error
    pub fn invalid_attributes(msg: impl Into<String>) -> Self {
        Self::InvalidAttributes(msg.into())
    }

    /// Check if this error disqualifies the provider from bidding on the
    /// reservation, as opposed to the reservation merely not fitting
    pub fn disqualifies_bid(&self) -> bool {
        matches!(self, Error::GroupResourceMismatch)
    }
}
