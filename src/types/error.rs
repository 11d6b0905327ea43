//! Error types for the POS payments engine
//!
//! This module defines all error types surfaced by the engine.
//!
//! # Error Categories
//!
//! - **Input validation**: bad card details, negative amounts — recoverable,
//!   the caller corrects the input and retries.
//! - **Idempotency**: replayed or conflicting idempotency keys.
//! - **Invariant violations**: illegal state transitions, non-terminal or
//!   duplicate ledger appends — these indicate a programming defect in the
//!   caller, not a business outcome.
//!
//! Gateway declines and timeouts are deliberately NOT errors: they produce
//! committed `Failed` records carrying a
//! [`FailureReason`](crate::types::FailureReason).

use crate::types::record::{PaymentId, PaymentMethod, PaymentState};
use rust_decimal::Decimal;
use thiserror::Error;

/// Structured reason for rejecting card details
///
/// Each variant maps to one validation rule so callers can report precisely
/// which field is wrong instead of a generic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CardError {
    /// Card number is outside the 13-19 digit range after whitespace stripping
    #[error("card number length {len} is outside the 13-19 digit range")]
    InvalidLength {
        /// Number of characters after stripping whitespace
        len: usize,
    },

    /// Card number contains characters other than ASCII digits
    #[error("card number contains non-digit characters")]
    NonNumeric,

    /// Card number digits do not satisfy the Luhn checksum
    #[error("card number failed the Luhn checksum")]
    ChecksumFailed,

    /// Expiry is not in MM/YY form
    #[error("expiry must use the MM/YY format")]
    InvalidExpiryFormat,

    /// Expiry parsed, but the month is not in 01-12
    #[error("expiry month {month:02} is outside 01-12")]
    InvalidExpiryMonth {
        /// The out-of-range month value
        month: u8,
    },

    /// CVV is not exactly three digits
    #[error("CVV must be exactly 3 digits")]
    InvalidCvv,
}

/// Main error type for the payments engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// A payment or tendered amount was negative
    #[error("amount {amount} is negative")]
    NegativeAmount {
        /// The offending amount
        amount: Decimal,
    },

    /// Card details failed validation before any authorization was attempted
    ///
    /// No payment id is consumed and nothing reaches the ledger.
    #[error("card rejected: {reason}")]
    CardRejected {
        /// Which validation rule the card failed
        reason: CardError,
    },

    /// The id counter can no longer advance
    ///
    /// This is fatal for the generator instance; it never wraps around.
    #[error("payment id space exhausted")]
    IdSpaceExhausted,

    /// A lifecycle transition not permitted by the state machine
    #[error("illegal payment state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the payment was in
        from: PaymentState,
        /// State the caller tried to move to
        to: PaymentState,
    },

    /// A cash payment tried to complete carrying an authorization code
    #[error("cash payments cannot complete with an authorization code")]
    UnexpectedAuthorization,

    /// A card or mobile payment tried to complete without an authorization code
    #[error("{method} payments require an authorization code to complete")]
    MissingAuthorization {
        /// The payment method missing its code
        method: PaymentMethod,
    },

    /// The ledger rejected a record that is not in a terminal state
    #[error("record {id} is not in a terminal state ({state})")]
    NotTerminal {
        /// Payment id of the rejected record
        id: PaymentId,
        /// The non-terminal state it was in
        state: PaymentState,
    },

    /// The ledger already holds a record with this id
    #[error("record {id} already exists in the ledger")]
    DuplicateRecord {
        /// The duplicated payment id
        id: PaymentId,
    },

    /// An idempotency table entry points at an id the ledger does not hold
    #[error("no ledger record found for payment {id}")]
    RecordMissing {
        /// The dangling payment id
        id: PaymentId,
    },

    /// The first request for this idempotency key has not finished yet
    #[error("a payment with idempotency key '{key}' is already in flight")]
    DuplicateInFlight {
        /// The contested key
        key: String,
    },

    /// An idempotency key was replayed with a different method or amount
    #[error("idempotency key '{key}' was already used for a different payment")]
    IdempotencyConflict {
        /// The misused key
        key: String,
    },
}

// Helper functions for creating common errors

impl PaymentError {
    /// Create a NegativeAmount error
    pub fn negative_amount(amount: Decimal) -> Self {
        PaymentError::NegativeAmount { amount }
    }

    /// Create a CardRejected error
    pub fn card_rejected(reason: CardError) -> Self {
        PaymentError::CardRejected { reason }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(from: PaymentState, to: PaymentState) -> Self {
        PaymentError::InvalidTransition { from, to }
    }

    /// Create a MissingAuthorization error
    pub fn missing_authorization(method: PaymentMethod) -> Self {
        PaymentError::MissingAuthorization { method }
    }

    /// Create a NotTerminal error
    pub fn not_terminal(id: PaymentId, state: PaymentState) -> Self {
        PaymentError::NotTerminal { id, state }
    }

    /// Create a DuplicateRecord error
    pub fn duplicate_record(id: PaymentId) -> Self {
        PaymentError::DuplicateRecord { id }
    }

    /// Create a RecordMissing error
    pub fn record_missing(id: PaymentId) -> Self {
        PaymentError::RecordMissing { id }
    }

    /// Create a DuplicateInFlight error
    pub fn duplicate_in_flight(key: &str) -> Self {
        PaymentError::DuplicateInFlight {
            key: key.to_owned(),
        }
    }

    /// Create an IdempotencyConflict error
    pub fn idempotency_conflict(key: &str) -> Self {
        PaymentError::IdempotencyConflict {
            key: key.to_owned(),
        }
    }
}
