//! Payment lifecycle state machine
//!
//! This module provides the PaymentStateMachine component that drives a single
//! in-flight payment from `Initiated` through `Authorizing` (for gateway-backed
//! methods) to exactly one terminal state. The machine owns the payment's data
//! while it is in flight; the immutable [`TransactionRecord`] is produced only
//! once a terminal state is reached, at which point the ledger takes ownership.
//!
//! # Invariants
//!
//! - Transitions follow [`PaymentState::can_transition_to`]; anything else is
//!   an `InvalidTransition` error. Terminal states are absorbing.
//! - A completed card or mobile payment always carries an authorization code;
//!   a completed cash payment never does.
//! - `ShortTendered` is reachable only for cash payments.

use crate::types::{
    FailureReason, PaymentError, PaymentId, PaymentMethod, PaymentState, TransactionRecord,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Drives one payment through its lifecycle
///
/// Created by the processor with a freshly issued id, advanced by explicit
/// transition calls, and consumed via [`PaymentStateMachine::into_record`]
/// once terminal.
#[derive(Debug, Clone)]
pub struct PaymentStateMachine {
    id: PaymentId,
    method: PaymentMethod,
    amount: Decimal,
    tendered: Option<Decimal>,
    state: PaymentState,
    authorization_code: Option<String>,
    failure: Option<FailureReason>,
    created_at: DateTime<Utc>,
}

impl PaymentStateMachine {
    /// Create a payment in the `Initiated` state
    pub fn new(id: PaymentId, method: PaymentMethod, amount: Decimal) -> Self {
        PaymentStateMachine {
            id,
            method,
            amount,
            tendered: None,
            state: PaymentState::Initiated,
            authorization_code: None,
            failure: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the tendered cash amount
    pub fn with_tendered(mut self, tendered: Decimal) -> Self {
        self.tendered = Some(tendered);
        self
    }

    /// The payment id this machine was created with
    pub fn id(&self) -> PaymentId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> PaymentState {
        self.state
    }

    /// Move to `Authorizing` before dispatching the gateway call
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the payment is `Initiated`.
    pub fn begin_authorization(&mut self) -> Result<(), PaymentError> {
        self.transition(PaymentState::Authorizing)
    }

    /// Move to `Completed`
    ///
    /// Card and mobile payments must supply the gateway's authorization code;
    /// cash payments must not.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the current state does not permit
    /// completion, `MissingAuthorization` / `UnexpectedAuthorization` if the
    /// code presence does not match the method.
    pub fn complete(&mut self, authorization_code: Option<String>) -> Result<(), PaymentError> {
        match (self.method, &authorization_code) {
            (PaymentMethod::Cash, Some(_)) => return Err(PaymentError::UnexpectedAuthorization),
            (PaymentMethod::Card | PaymentMethod::Mobile, None) => {
                return Err(PaymentError::missing_authorization(self.method));
            }
            _ => {}
        }
        self.transition(PaymentState::Completed)?;
        self.authorization_code = authorization_code;
        Ok(())
    }

    /// Move a cash payment to `ShortTendered`
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for non-cash payments or when the current
    /// state does not permit it.
    pub fn short_tender(&mut self) -> Result<(), PaymentError> {
        if self.method != PaymentMethod::Cash {
            return Err(PaymentError::invalid_transition(
                self.state,
                PaymentState::ShortTendered,
            ));
        }
        self.transition(PaymentState::ShortTendered)
    }

    /// Move to `Failed`, recording why
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the current state does not permit
    /// failing (i.e. the payment is already terminal).
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), PaymentError> {
        self.transition(PaymentState::Failed)?;
        self.failure = Some(reason);
        Ok(())
    }

    /// Consume the machine, producing the immutable ledger record
    ///
    /// # Errors
    ///
    /// Returns `NotTerminal` if the payment has not reached a terminal state.
    pub fn into_record(self) -> Result<TransactionRecord, PaymentError> {
        if !self.state.is_terminal() {
            return Err(PaymentError::not_terminal(self.id, self.state));
        }
        Ok(TransactionRecord {
            id: self.id,
            method: self.method,
            amount: self.amount,
            tendered: self.tendered,
            created_at: self.created_at,
            status: self.state,
            authorization_code: self.authorization_code,
            failure: self.failure,
        })
    }

    fn transition(&mut self, to: PaymentState) -> Result<(), PaymentError> {
        if !self.state.can_transition_to(to) {
            return Err(PaymentError::invalid_transition(self.state, to));
        }
        self.state = to;
        Ok(())
    }
}
