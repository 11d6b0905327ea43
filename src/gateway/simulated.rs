//! Simulated gateway for demos and tests
//!
//! Stands in for a real card or mobile-money integration. The behavior is
//! fixed at construction: approve everything, decline everything, or stall
//! forever (useful for exercising the processor's timeout bound). An optional
//! latency can be layered on top of approve/decline responses.

use super::{Authorization, CardGateway, GatewayError, MobileMoneyGateway};
use crate::core::card_validator::CardDetails;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// How the simulated gateway responds to every authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedBehavior {
    /// Approve with a fresh authorization code
    Approve,
    /// Decline with a fixed reason
    Decline,
    /// Never respond; the caller's timeout decides the outcome
    Stall,
}

/// Gateway stand-in implementing both authorization capabilities
///
/// Authorization codes are `MP`-prefixed six-digit values drawn from an
/// internal counter, so successive approvals are distinct and deterministic.
#[derive(Debug)]
pub struct SimulatedGateway {
    behavior: SimulatedBehavior,
    latency: Option<Duration>,
    next_code: AtomicU32,
}

impl SimulatedGateway {
    /// A gateway that approves every authorization
    pub fn approving() -> Self {
        Self::with_behavior(SimulatedBehavior::Approve)
    }

    /// A gateway that declines every authorization
    pub fn declining() -> Self {
        Self::with_behavior(SimulatedBehavior::Decline)
    }

    /// A gateway that never answers
    pub fn stalled() -> Self {
        Self::with_behavior(SimulatedBehavior::Stall)
    }

    /// A gateway with the given fixed behavior
    pub fn with_behavior(behavior: SimulatedBehavior) -> Self {
        SimulatedGateway {
            behavior,
            latency: None,
            next_code: AtomicU32::new(100_000),
        }
    }

    /// Add a fixed response latency to approve/decline behaviors
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn respond(&self) -> Result<Authorization, GatewayError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.behavior {
            SimulatedBehavior::Approve => Ok(Authorization {
                code: format!("MP{}", self.next_code.fetch_add(1, Ordering::Relaxed)),
            }),
            SimulatedBehavior::Decline => Err(GatewayError::Declined {
                reason: "do not honor".to_owned(),
            }),
            SimulatedBehavior::Stall => std::future::pending().await,
        }
    }
}

#[async_trait]
impl CardGateway for SimulatedGateway {
    async fn authorize(
        &self,
        _amount: Decimal,
        _card: &CardDetails,
    ) -> Result<Authorization, GatewayError> {
        self.respond().await
    }
}

#[async_trait]
impl MobileMoneyGateway for SimulatedGateway {
    async fn authorize(
        &self,
        _amount: Decimal,
        _phone_number: &str,
    ) -> Result<Authorization, GatewayError> {
        self.respond().await
    }
}
