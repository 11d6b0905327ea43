//! Benchmark suite for the engine's hot paths
//!
//! Micro-benchmarks for the operations a busy store floor hits on every sale:
//! card validation, id issuance, ledger commits and lookups, and the full
//! local cash path.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use pos_payments_engine::{
    card_validator, CardDetails, IdGenerator, PaymentProcessor, ProcessorConfig, SimulatedGateway,
    TransactionLedger,
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() {
    divan::main();
}

/// Benchmark Luhn/expiry/CVV validation of a well-formed card
#[divan::bench]
fn validate_card() {
    let card = CardDetails::new("4539 4512 0398 7356", "08/27", "123", "VISA");
    divan::black_box(card_validator::validate(&card)).expect("card should validate");
}

/// Benchmark issuing 1,000 payment ids from one generator
#[divan::bench]
fn issue_ids() {
    let ids = IdGenerator::new();
    for _ in 0..1_000 {
        divan::black_box(ids.next().expect("id space not exhausted"));
    }
}

/// Benchmark committing 1,000 cash sales and looking each one back up
#[divan::bench]
fn commit_and_lookup() {
    let processor = PaymentProcessor::new(
        Arc::new(IdGenerator::new()),
        Arc::new(TransactionLedger::new()),
        Arc::new(SimulatedGateway::approving()),
        Arc::new(SimulatedGateway::approving()),
        ProcessorConfig::default(),
    );

    let amount = Decimal::new(55_000, 2);
    let tendered = Decimal::new(60_000, 2);
    for _ in 0..1_000 {
        let record = processor
            .process_cash(amount, tendered)
            .expect("cash sale should settle");
        divan::black_box(processor.ledger().find_by_id(record.id));
    }
}
