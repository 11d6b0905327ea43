//! Core business logic module
//!
//! This module contains the core payment processing components:
//! - `id_generator` - Unique, monotonically increasing payment ids
//! - `card_validator` - Pure card number/expiry/CVV validation
//! - `state_machine` - Payment lifecycle with absorbing terminal states
//! - `ledger` - Append-only store of settled payment records
//! - `processor` - Orchestration across validation, authorization, and commit

pub mod card_validator;
pub mod id_generator;
pub mod ledger;
pub mod processor;
pub mod state_machine;

pub use card_validator::CardDetails;
pub use id_generator::IdGenerator;
pub use ledger::TransactionLedger;
pub use processor::{PaymentProcessor, ProcessorConfig};
pub use state_machine::PaymentStateMachine;
