//! # Core Errors
//!
//! Every operation in the core returns a typed result. A failed operation
//! leaves the entity in its prior, valid state; no error here is fatal to
//! the process, and none is retried automatically by the core.

use thiserror::Error;
use uuid::Uuid;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Typed failures surfaced to the transport collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    // ==================
    // Input Errors
    // ==================
    /// Malformed or missing input (empty rejection reason, bad dates, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity id does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "tour"
        entity: &'static str,
        /// The id that was looked up
        id: Uuid,
    },

    // ==================
    // Transition Errors
    // ==================
    /// Required precondition state does not match the current state.
    /// Also returned to the loser of a transition race.
    #[error("{entity} {id}: cannot {attempted} while {current}")]
    InvalidTransition {
        /// Entity kind
        entity: &'static str,
        /// Entity id
        id: Uuid,
        /// State observed at the atomic check
        current: &'static str,
        /// Name of the attempted transition
        attempted: &'static str,
    },

    /// Operation-specific business conflict (e.g. deletion already pending)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Actor does not own the entity it is trying to mutate
    #[error("Not authorized to modify this resource")]
    Forbidden,

    // ==================
    // Allocator Errors
    // ==================
    /// All promotion slots for the type are occupied
    #[error("No promotion slots available for this promotion type")]
    SlotsExhausted,

    // ==================
    // Auction Errors
    // ==================
    /// Bid deadline has passed
    #[error("Bidding is closed for this tour")]
    BiddingClosed,

    /// Bid does not exceed the currently winning amount
    #[error("Bid of {offered} does not exceed the current highest bid of {current}")]
    BidTooLow {
        /// Amount the bidder offered
        offered: u64,
        /// Winning amount at the time of the atomic check
        current: u64,
    },

    // ==================
    // Internal Errors
    // ==================
    /// Store-level failure (poisoned lock)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a not-found error.
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Returns the HTTP status code the transport layer should map this to
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            CoreError::Validation(_) => 400,

            // 403 Forbidden
            CoreError::Forbidden => 403,

            // 404 Not Found
            CoreError::NotFound { .. } => 404,

            // 409 Conflict
            CoreError::InvalidTransition { .. } => 409,
            CoreError::Conflict(_) => 409,
            CoreError::SlotsExhausted => 409,
            CoreError::BiddingClosed => 409,
            CoreError::BidTooLow { .. } => 409,

            // 500 Internal Server Error
            CoreError::Internal(_) => 500,
        }
    }

    /// Returns whether this error is the caller's fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
