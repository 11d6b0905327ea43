//! Payment id issuance
//!
//! This module provides the IdGenerator component that hands out unique,
//! strictly increasing payment identifiers. Ids start from a fixed base and
//! are never reused, even for payments that end up failed: an id that was
//! consumed stays consumed.
//!
//! # Thread Safety
//!
//! Issuance is a single atomic update, so any number of terminals can share
//! one generator without ever observing a duplicate id.

use crate::types::{PaymentError, PaymentId};
use std::sync::atomic::{AtomicU32, Ordering};

/// Issues unique, monotonically increasing payment ids
///
/// State is instance-scoped: two generators are fully independent, and a
/// generator is shared explicitly (typically via `Arc`) rather than through
/// any process-wide state.
#[derive(Debug)]
pub struct IdGenerator {
    /// The next id to hand out
    next: AtomicU32,
}

impl IdGenerator {
    /// First id issued by a generator created with [`IdGenerator::new`]
    pub const BASE: PaymentId = 1001;

    /// Create a generator starting at [`IdGenerator::BASE`]
    pub fn new() -> Self {
        Self::with_base(Self::BASE)
    }

    /// Create a generator starting at an arbitrary base
    pub fn with_base(base: PaymentId) -> Self {
        IdGenerator {
            next: AtomicU32::new(base),
        }
    }

    /// Issue the next id
    ///
    /// Strictly increasing with no intentional gaps. Concurrent callers each
    /// receive a distinct value.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::IdSpaceExhausted` once the counter can no longer
    /// advance. The counter never wraps around.
    pub fn next(&self) -> Result<PaymentId, PaymentError> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map_err(|_| PaymentError::IdSpaceExhausted)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
