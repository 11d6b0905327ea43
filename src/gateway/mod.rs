//! External authorization gateway contracts
//!
//! The engine never speaks a gateway wire protocol itself. Card and
//! mobile-money authorization are delegated through the object-safe traits
//! defined here, so production code can plug in a real integration and tests
//! can inject instantaneous or failing responses without real delay.
//!
//! Timeouts are not a gateway concern: the processor bounds every
//! authorization call with its configured timeout and turns an overrun into a
//! `Failed` record with reason `Timeout`.

pub mod simulated;

pub use simulated::{SimulatedBehavior, SimulatedGateway};

use crate::core::card_validator::CardDetails;
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Successful authorization response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Gateway-issued authorization code, recorded on the completed payment
    pub code: String,
}

/// Why a gateway did not authorize a payment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Explicit business decline; not retryable with the same payment details
    #[error("authorization declined: {reason}")]
    Declined {
        /// Gateway-supplied decline reason
        reason: String,
    },

    /// The gateway could not be reached or answered with a transport error
    #[error("gateway unavailable: {message}")]
    Unavailable {
        /// Transport-level detail
        message: String,
    },
}

/// Card authorization capability
#[async_trait]
pub trait CardGateway: Send + Sync {
    /// Authorize a card payment
    async fn authorize(
        &self,
        amount: Decimal,
        card: &CardDetails,
    ) -> Result<Authorization, GatewayError>;
}

/// Mobile-money authorization capability
#[async_trait]
pub trait MobileMoneyGateway: Send + Sync {
    /// Authorize a mobile-money payment against a subscriber number
    async fn authorize(
        &self,
        amount: Decimal,
        phone_number: &str,
    ) -> Result<Authorization, GatewayError>;
}
