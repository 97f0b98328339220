//! Error types for the soulbound issuance core.
//!
//! Every failure is rejected atomically before any state mutation or event
//! emission, so a returned error means nothing became visible. There is no
//! automatic retry for instance or factory operations; callers resubmit
//! with corrected inputs.

use crate::types::{Address, FeeAmount, TokenId};
use thiserror::Error;

/// Result type for issuance instance operations.
pub type IssuanceResult<T> = Result<T, IssuanceError>;

/// Result type for factory registry operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Result type for event log operations.
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Errors raised by an issuance instance.
///
/// Each operation on [`crate::MembershipCollection`] validates its own
/// precondition and permission independently and rejects with one of these
/// variants before any effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuanceError {
    /// The caller lacks the capability the operation requires.
    #[error("unauthorized: {0} may not perform this operation")]
    Unauthorized(Address),

    /// The holder already holds a token in this collection. The slot is
    /// held for the collection's lifetime; burning does not free it.
    #[error("address {0} already minted a token in this collection")]
    AlreadyMinted(Address),

    /// The collection's max supply is nonzero and has been reached.
    #[error("max supply of {0} reached")]
    SupplyExhausted(u64),

    /// The collection's burn-authorization policy does not permit this
    /// caller to burn the token.
    #[error("burning token {0} is not authorized for this caller")]
    BurnNotAuthorized(TokenId),

    /// The token's locked flag is set; transfer is impossible until the
    /// issuer unlocks it.
    #[error("token {0} is locked")]
    TokenLocked(TokenId),

    /// The zero address is reserved as the burn signal; a transfer cannot
    /// name it as the destination. Only `burn` emits that signal.
    #[error("token {0} cannot be transferred to the zero address")]
    ZeroAddressTransfer(TokenId),

    /// The collection is paused; minting is suspended.
    #[error("collection is paused")]
    Paused,

    /// The token does not exist or has been burned.
    #[error("token {0} not found")]
    NotFound(TokenId),

    /// The event log rejected the append.
    #[error("event log error: {0}")]
    EventLog(#[from] EventLogError),
}

/// Errors raised by the factory registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// The caller is not the registry owner.
    #[error("unauthorized: {0} is not the registry owner")]
    Unauthorized(Address),

    /// The payment does not cover the current creation fee.
    #[error("insufficient fee: required {required}, paid {paid}")]
    InsufficientFee {
        /// The creation fee in force at the time of the call.
        required: FeeAmount,
        /// The amount actually paid.
        paid: FeeAmount,
    },

    /// `initialize` was called more than once.
    #[error("factory already initialized")]
    AlreadyInitialized,

    /// An operation was attempted before `initialize`.
    #[error("factory not initialized")]
    NotInitialized,

    /// The event log rejected the append.
    #[error("event log error: {0}")]
    EventLog(#[from] EventLogError),
}

/// Errors raised by the event log boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    /// The underlying storage failed mid-operation.
    #[error("event log storage failure during {operation}")]
    StoreFailure {
        /// The operation that observed the failure.
        operation: &'static str,
    },

    /// `append` was called with no events; there is no position to return.
    #[error("cannot append an empty event batch")]
    EmptyBatch,
}
