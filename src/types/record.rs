//! Transaction-related types for the POS payments engine
//!
//! This module defines the payment method, lifecycle state, and ledger record
//! types used throughout the system for processing point-of-sale payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment identifier
///
/// Issued by [`crate::core::IdGenerator`] starting from a fixed base.
/// Ids are unique for the lifetime of a generator/ledger pair and are
/// never reused, even for failed payments.
pub type PaymentId = u32;

/// Payment methods supported by the engine
///
/// Cash is settled locally at the terminal; card and mobile-money payments
/// are authorized through an external gateway collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash handed over at the terminal
    Cash,
    /// Card payment authorized via a card gateway
    Card,
    /// Mobile-money payment authorized via a mobile-money gateway
    Mobile,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a payment
///
/// A payment starts in `Initiated`, may pass through `Authorizing` while an
/// external gateway call is in flight, and ends in exactly one of the terminal
/// states. Terminal states are absorbing: no transition ever leaves them.
///
/// `ShortTendered` is the cash-only outcome where the customer handed over
/// less than the sale amount. It is deliberately distinct from `Failed`: the
/// sale happened and the customer still owes the difference, whereas a failed
/// payment is void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentState {
    /// Payment created with a fresh id; no authorization attempted yet
    Initiated,
    /// Authorization request dispatched to the external gateway
    Authorizing,
    /// Authorization succeeded (or cash covered the amount)
    Completed,
    /// Cash payment where the tendered amount fell short of the sale amount
    ShortTendered,
    /// Authorization declined, timed out, or otherwise unsuccessful
    Failed,
}

impl PaymentState {
    /// Whether this state is terminal (absorbing)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::Completed | PaymentState::ShortTendered | PaymentState::Failed
        )
    }

    /// Whether a transition from this state to `next` is legal
    ///
    /// Legal transitions:
    /// - `Initiated` -> `Authorizing`, `Completed`, `ShortTendered`, `Failed`
    /// - `Authorizing` -> `Completed`, `Failed`
    ///
    /// Terminal states permit no outgoing transitions.
    pub fn can_transition_to(&self, next: PaymentState) -> bool {
        match self {
            PaymentState::Initiated => !matches!(next, PaymentState::Initiated),
            PaymentState::Authorizing => {
                matches!(next, PaymentState::Completed | PaymentState::Failed)
            }
            PaymentState::Completed | PaymentState::ShortTendered | PaymentState::Failed => false,
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentState::Initiated => "initiated",
            PaymentState::Authorizing => "authorizing",
            PaymentState::Completed => "completed",
            PaymentState::ShortTendered => "short-tendered",
            PaymentState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a payment ended in the `Failed` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// The gateway explicitly declined the authorization
    Declined,
    /// The authorization did not answer within the configured bound
    Timeout,
    /// The gateway could not be reached at all
    Unavailable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::Declined => "declined",
            FailureReason::Timeout => "timeout",
            FailureReason::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// Immutable ledger entry for a settled payment
///
/// A record only exists at a terminal status. While a payment is in flight it
/// lives inside a [`crate::core::PaymentStateMachine`]; the record is produced
/// once, on reaching a terminal state, and committed to the ledger exactly
/// once. The ledger hands out shared references only, so a committed record
/// can never be mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique payment identifier, assigned once
    pub id: PaymentId,

    /// How the customer paid
    pub method: PaymentMethod,

    /// Sale amount, always non-negative
    pub amount: Decimal,

    /// Cash handed over by the customer; present only for cash payments
    ///
    /// May exceed or fall short of `amount`; see [`TransactionRecord::change`].
    pub tendered: Option<Decimal>,

    /// When the payment was initiated
    pub created_at: DateTime<Utc>,

    /// Terminal status of the payment
    pub status: PaymentState,

    /// Gateway authorization code
    ///
    /// Present iff `status` is `Completed` for a card or mobile payment.
    /// Cash payments and failed payments carry no code.
    pub authorization_code: Option<String>,

    /// Failure classification; present iff `status` is `Failed`
    pub failure: Option<FailureReason>,
}

impl TransactionRecord {
    /// Change owed back to the customer (`tendered - amount`)
    ///
    /// Returns `None` for non-cash payments. A negative value means the
    /// customer still owes money; it is reported as-is, never clamped.
    pub fn change(&self) -> Option<Decimal> {
        self.tendered.map(|tendered| tendered - self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(PaymentState::Initiated, false)]
    #[case(PaymentState::Authorizing, false)]
    #[case(PaymentState::Completed, true)]
    #[case(PaymentState::ShortTendered, true)]
    #[case(PaymentState::Failed, true)]
    fn test_terminal_states(#[case] state: PaymentState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[rstest]
    #[case(PaymentState::Initiated, PaymentState::Authorizing, true)]
    #[case(PaymentState::Initiated, PaymentState::Completed, true)]
    #[case(PaymentState::Initiated, PaymentState::ShortTendered, true)]
    #[case(PaymentState::Initiated, PaymentState::Failed, true)]
    #[case(PaymentState::Authorizing, PaymentState::Completed, true)]
    #[case(PaymentState::Authorizing, PaymentState::Failed, true)]
    #[case(PaymentState::Authorizing, PaymentState::ShortTendered, false)]
    #[case(PaymentState::Authorizing, PaymentState::Initiated, false)]
    #[case(PaymentState::Completed, PaymentState::Failed, false)]
    #[case(PaymentState::ShortTendered, PaymentState::Completed, false)]
    #[case(PaymentState::Failed, PaymentState::Authorizing, false)]
    fn test_transition_table(
        #[case] from: PaymentState,
        #[case] to: PaymentState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_change_is_reported_unclamped() {
        let record = TransactionRecord {
            id: 1001,
            method: PaymentMethod::Cash,
            amount: dec!(550.00),
            tendered: Some(dec!(300.00)),
            created_at: Utc::now(),
            status: PaymentState::ShortTendered,
            authorization_code: None,
            failure: None,
        };

        assert_eq!(record.change(), Some(dec!(-250.00)));
    }

    #[test]
    fn test_change_absent_for_non_cash() {
        let record = TransactionRecord {
            id: 1002,
            method: PaymentMethod::Card,
            amount: dec!(1200.00),
            tendered: None,
            created_at: Utc::now(),
            status: PaymentState::Completed,
            authorization_code: Some("MP100000".to_owned()),
            failure: None,
        };

        assert_eq!(record.change(), None);
    }
}
