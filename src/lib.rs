//! POS Payments Engine Library
//! # Overview
//!
//! This library provides the transaction core of a point-of-sale payment
//! system: a payment lifecycle state machine and an append-only transaction
//! ledger, orchestrated by a processor that takes cash, card, and
//! mobile-money payments.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (TransactionRecord, PaymentState, errors)
//! - [`core`] - Business logic components:
//!   - [`core::processor`] - Payment orchestration and idempotency
//!   - [`core::state_machine`] - Payment lifecycle management
//!   - [`core::ledger`] - Append-only transaction history
//!   - [`core::card_validator`] - Luhn/expiry/CVV validation
//!   - [`core::id_generator`] - Unique payment id issuance
//! - [`gateway`] - External authorization contracts and a simulated gateway
//!
//! # Payment Methods
//!
//! The engine supports three payment methods:
//!
//! - **Cash**: settled locally; completes when the tendered amount covers the
//!   sale, otherwise recorded as short-tendered with the shortfall reported
//! - **Card**: validated locally (Luhn, expiry, CVV), then authorized through
//!   an external card gateway
//! - **Mobile**: authorized through an external mobile-money gateway
//!
//! # Lifecycle
//!
//! Every payment moves `Initiated` → (`Authorizing` →) one terminal state
//! (`Completed`, `ShortTendered`, or `Failed`), and exactly one immutable
//! record per payment is committed to the ledger on reaching that terminal
//! state. Gateway authorizations are bounded by a configurable timeout;
//! retried requests are de-duplicated with caller-supplied idempotency keys.

// Module declarations
pub mod core;
pub mod gateway;
pub mod types;

pub use core::{
    card_validator, CardDetails, IdGenerator, PaymentProcessor, PaymentStateMachine,
    ProcessorConfig, TransactionLedger,
};
pub use gateway::{
    Authorization, CardGateway, GatewayError, MobileMoneyGateway, SimulatedGateway,
};
pub use types::{
    CardError, FailureReason, PaymentError, PaymentId, PaymentMethod, PaymentState,
    TransactionRecord,
};
