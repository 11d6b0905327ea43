//! Payment processing orchestration
//!
//! This module provides the PaymentProcessor, the engine's only entry point
//! for taking payments. It coordinates the other core components: card
//! validation, id issuance, the lifecycle state machine, gateway
//! authorization, and the final ledger commit.
//!
//! # Design
//!
//! A processor models one terminal. Several processors can share one
//! [`IdGenerator`] and one [`TransactionLedger`] (several tills in a store);
//! the shared components carry their own synchronization, and the processor
//! holds no lock across the gateway await, so a slow authorization on one
//! till never blocks id issuance or history reads on another.
//!
//! # Commit discipline
//!
//! Every accepted payment commits exactly one terminal record:
//! - Cash settles locally and commits `Completed` or `ShortTendered`.
//! - Card and mobile payments authorize through their gateway under the
//!   configured timeout; approval commits `Completed`, a decline or timeout
//!   commits `Failed`. These are business outcomes, not errors.
//! - Card validation failures happen before an id is consumed: they return an
//!   error and leave no trace in the ledger.
//!
//! Card and mobile payments take a caller-supplied idempotency key. Replaying
//! a key returns the originally committed record instead of charging again;
//! retrying after a timeout therefore requires a fresh key.

use crate::core::card_validator::{self, CardDetails};
use crate::core::id_generator::IdGenerator;
use crate::core::ledger::TransactionLedger;
use crate::core::state_machine::PaymentStateMachine;
use crate::gateway::{Authorization, CardGateway, GatewayError, MobileMoneyGateway};
use crate::types::{FailureReason, PaymentError, PaymentId, PaymentMethod, TransactionRecord};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Upper bound on a single gateway authorization call
    ///
    /// An authorization still unanswered at the bound is treated as failed
    /// with reason `Timeout`.
    pub authorization_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            authorization_timeout: Duration::from_secs(5),
        }
    }
}

/// Orchestrates cash, card, and mobile-money payments
pub struct PaymentProcessor {
    ids: Arc<IdGenerator>,
    ledger: Arc<TransactionLedger>,
    card_gateway: Arc<dyn CardGateway>,
    mobile_gateway: Arc<dyn MobileMoneyGateway>,
    config: ProcessorConfig,

    /// Idempotency keys whose payment has been committed, mapped to the
    /// committed record's id
    committed_keys: DashMap<String, PaymentId>,

    /// Idempotency keys with an authorization currently in flight
    in_flight_keys: DashMap<String, ()>,
}

impl PaymentProcessor {
    /// Create a processor over shared engine components
    ///
    /// # Arguments
    ///
    /// * `ids` - Id generator, shared across terminals
    /// * `ledger` - Transaction ledger, shared across terminals
    /// * `card_gateway` - External card authorization collaborator
    /// * `mobile_gateway` - External mobile-money authorization collaborator
    /// * `config` - Timeout configuration
    pub fn new(
        ids: Arc<IdGenerator>,
        ledger: Arc<TransactionLedger>,
        card_gateway: Arc<dyn CardGateway>,
        mobile_gateway: Arc<dyn MobileMoneyGateway>,
        config: ProcessorConfig,
    ) -> Self {
        PaymentProcessor {
            ids,
            ledger,
            card_gateway,
            mobile_gateway,
            config,
            committed_keys: DashMap::new(),
            in_flight_keys: DashMap::new(),
        }
    }

    /// The ledger this processor commits to
    pub fn ledger(&self) -> Arc<TransactionLedger> {
        Arc::clone(&self.ledger)
    }

    /// Process a cash payment
    ///
    /// Settles locally: `Completed` when the tendered cash covers the amount,
    /// `ShortTendered` otherwise. Negative change is a reported business
    /// outcome (the customer still owes the difference), never an error.
    ///
    /// # Errors
    ///
    /// * `PaymentError::NegativeAmount` if `amount` or `tendered` is negative
    /// * `PaymentError::IdSpaceExhausted` if no id can be issued
    pub fn process_cash(
        &self,
        amount: Decimal,
        tendered: Decimal,
    ) -> Result<Arc<TransactionRecord>, PaymentError> {
        check_amount(amount)?;
        check_amount(tendered)?;

        let id = self.ids.next()?;
        let mut payment =
            PaymentStateMachine::new(id, PaymentMethod::Cash, amount).with_tendered(tendered);
        if tendered >= amount {
            payment.complete(None)?;
        } else {
            payment.short_tender()?;
        }

        let record = self.ledger.append(payment.into_record()?)?;
        info!(
            id = record.id,
            status = %record.status,
            %amount,
            %tendered,
            "cash payment recorded"
        );
        Ok(record)
    }

    /// Process a card payment
    ///
    /// Card details are validated first; a validation failure is returned as
    /// `CardRejected` without consuming an id or touching the ledger. A valid
    /// card is authorized through the card gateway under the configured
    /// timeout, and the terminal outcome — `Completed` on approval, `Failed`
    /// on decline or timeout — is committed and returned.
    ///
    /// # Arguments
    ///
    /// * `amount` - Sale amount
    /// * `card` - Card details as captured at the terminal
    /// * `idempotency_key` - Caller-supplied key identifying this logical
    ///   payment; replaying it returns the already-committed record
    pub async fn process_card(
        &self,
        amount: Decimal,
        card: CardDetails,
        idempotency_key: &str,
    ) -> Result<Arc<TransactionRecord>, PaymentError> {
        check_amount(amount)?;
        card_validator::validate(&card).map_err(PaymentError::card_rejected)?;

        if let Some(prior) = self.replay_or_reserve(idempotency_key, PaymentMethod::Card, amount)? {
            return Ok(prior);
        }

        let result = match self.ids.next() {
            Ok(id) => {
                self.settle(
                    id,
                    PaymentMethod::Card,
                    amount,
                    self.card_gateway.authorize(amount, &card),
                )
                .await
            }
            Err(err) => Err(err),
        };
        self.finish_key(idempotency_key, &result);
        result
    }

    /// Process a mobile-money payment
    ///
    /// Delegates authorization to the mobile-money gateway under the
    /// configured timeout; the terminal outcome is committed and returned.
    /// See [`PaymentProcessor::process_card`] for the idempotency contract.
    pub async fn process_mobile(
        &self,
        amount: Decimal,
        phone_number: &str,
        idempotency_key: &str,
    ) -> Result<Arc<TransactionRecord>, PaymentError> {
        check_amount(amount)?;

        if let Some(prior) =
            self.replay_or_reserve(idempotency_key, PaymentMethod::Mobile, amount)?
        {
            return Ok(prior);
        }

        let result = match self.ids.next() {
            Ok(id) => {
                self.settle(
                    id,
                    PaymentMethod::Mobile,
                    amount,
                    self.mobile_gateway.authorize(amount, phone_number),
                )
                .await
            }
            Err(err) => Err(err),
        };
        self.finish_key(idempotency_key, &result);
        result
    }

    /// Drive a gateway-backed payment from `Initiated` to its committed record
    ///
    /// The authorization future is awaited under the configured timeout with
    /// no lock held on the ledger or id generator. Nothing reaches the ledger
    /// until the payment is terminal.
    async fn settle<F>(
        &self,
        id: PaymentId,
        method: PaymentMethod,
        amount: Decimal,
        authorize: F,
    ) -> Result<Arc<TransactionRecord>, PaymentError>
    where
        F: Future<Output = Result<Authorization, GatewayError>>,
    {
        let mut payment = PaymentStateMachine::new(id, method, amount);
        payment.begin_authorization()?;

        match timeout(self.config.authorization_timeout, authorize).await {
            Ok(Ok(authorization)) => payment.complete(Some(authorization.code))?,
            Ok(Err(err)) => {
                warn!(id, %method, error = %err, "authorization unsuccessful");
                payment.fail(failure_reason(&err))?;
            }
            Err(_) => {
                warn!(
                    id,
                    %method,
                    timeout_ms = self.config.authorization_timeout.as_millis() as u64,
                    "authorization timed out"
                );
                payment.fail(FailureReason::Timeout)?;
            }
        }

        let record = self.ledger.append(payment.into_record()?)?;
        info!(id = record.id, %method, status = %record.status, %amount, "payment recorded");
        Ok(record)
    }

    /// Replay a committed idempotency key, or reserve it for this call
    ///
    /// Returns `Ok(Some(record))` when the key already committed a payment
    /// with the same method and amount.
    ///
    /// # Errors
    ///
    /// * `DuplicateInFlight` if another call holds the key right now
    /// * `IdempotencyConflict` if the key committed a different payment
    /// * `RecordMissing` if the key table and ledger disagree (a defect)
    fn replay_or_reserve(
        &self,
        key: &str,
        method: PaymentMethod,
        amount: Decimal,
    ) -> Result<Option<Arc<TransactionRecord>>, PaymentError> {
        if let Some(id) = self.committed_keys.get(key).map(|entry| *entry.value()) {
            return self.replay(key, id, method, amount).map(Some);
        }

        if self.in_flight_keys.insert(key.to_owned(), ()).is_some() {
            return Err(PaymentError::duplicate_in_flight(key));
        }

        // A commit may have landed between the lookup and the reservation;
        // check again now that the key is ours.
        if let Some(id) = self.committed_keys.get(key).map(|entry| *entry.value()) {
            self.in_flight_keys.remove(key);
            return self.replay(key, id, method, amount).map(Some);
        }

        Ok(None)
    }

    fn replay(
        &self,
        key: &str,
        id: PaymentId,
        method: PaymentMethod,
        amount: Decimal,
    ) -> Result<Arc<TransactionRecord>, PaymentError> {
        let record = self
            .ledger
            .find_by_id(id)
            .ok_or_else(|| PaymentError::record_missing(id))?;
        if record.method != method || record.amount != amount {
            return Err(PaymentError::idempotency_conflict(key));
        }
        debug!(id, key, "idempotent replay, returning committed record");
        Ok(record)
    }

    /// Resolve the key reservation once the call is over
    ///
    /// A committed record binds the key permanently; any error releases the
    /// reservation so the caller may retry with the same key.
    fn finish_key(&self, key: &str, result: &Result<Arc<TransactionRecord>, PaymentError>) {
        match result {
            Ok(record) => {
                self.committed_keys.insert(key.to_owned(), record.id);
                self.in_flight_keys.remove(key);
            }
            Err(_) => {
                self.in_flight_keys.remove(key);
            }
        }
    }
}

fn check_amount(amount: Decimal) -> Result<(), PaymentError> {
    if amount < Decimal::ZERO {
        return Err(PaymentError::negative_amount(amount));
    }
    Ok(())
}

fn failure_reason(err: &GatewayError) -> FailureReason {
    match err {
        GatewayError::Declined { .. } => FailureReason::Declined,
        GatewayError::Unavailable { .. } => FailureReason::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SimulatedGateway;
    use crate::types::PaymentState;
    use rust_decimal_macros::dec;

    fn processor_with(
        card_gateway: SimulatedGateway,
        mobile_gateway: SimulatedGateway,
    ) -> PaymentProcessor {
        PaymentProcessor::new(
            Arc::new(IdGenerator::new()),
            Arc::new(TransactionLedger::new()),
            Arc::new(card_gateway),
            Arc::new(mobile_gateway),
            ProcessorConfig::default(),
        )
    }

    fn approving_processor() -> PaymentProcessor {
        processor_with(SimulatedGateway::approving(), SimulatedGateway::approving())
    }

    fn valid_card() -> CardDetails {
        CardDetails::new("4539 4512 0398 7356", "08/27", "123", "VISA")
    }

    #[test]
    fn test_cash_with_sufficient_tender_completes() {
        let processor = approving_processor();

        let record = processor.process_cash(dec!(550.00), dec!(600.00)).unwrap();

        assert_eq!(record.id, 1001);
        assert_eq!(record.status, PaymentState::Completed);
        assert_eq!(record.change(), Some(dec!(50.00)));
        assert_eq!(record.authorization_code, None);
        assert_eq!(processor.ledger().len(), 1);
    }

    #[test]
    fn test_cash_with_exact_tender_completes() {
        let processor = approving_processor();

        let record = processor.process_cash(dec!(100.00), dec!(100.00)).unwrap();

        assert_eq!(record.status, PaymentState::Completed);
        assert_eq!(record.change(), Some(dec!(0.00)));
    }

    #[test]
    fn test_cash_short_tender_is_recorded_not_raised() {
        let processor = approving_processor();

        let record = processor.process_cash(dec!(550.00), dec!(300.00)).unwrap();

        assert_eq!(record.amount, dec!(550.00));
        assert_eq!(record.tendered, Some(dec!(300.00)));
        assert_eq!(record.status, PaymentState::ShortTendered);
        assert_eq!(record.change(), Some(dec!(-250.00)));
        assert_eq!(processor.ledger().len(), 1);
    }

    #[test]
    fn test_cash_rejects_negative_amounts() {
        let processor = approving_processor();

        assert!(matches!(
            processor.process_cash(dec!(-1.00), dec!(10.00)),
            Err(PaymentError::NegativeAmount { .. })
        ));
        assert!(matches!(
            processor.process_cash(dec!(10.00), dec!(-1.00)),
            Err(PaymentError::NegativeAmount { .. })
        ));
        assert!(processor.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_card_payment_completes_with_authorization_code() {
        let processor = approving_processor();

        let record = processor
            .process_card(dec!(1200.00), valid_card(), "key-1")
            .await
            .unwrap();

        assert_eq!(record.status, PaymentState::Completed);
        assert!(record.authorization_code.as_deref().unwrap().starts_with("MP"));
        assert_eq!(record.failure, None);
        assert_eq!(processor.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_card_consumes_no_id_and_writes_nothing() {
        let processor = approving_processor();

        let result = processor
            .process_card(
                dec!(100.00),
                CardDetails::new("4539 4512 0398 7357", "08/27", "123", "VISA"),
                "key-1",
            )
            .await;

        assert_eq!(
            result,
            Err(PaymentError::card_rejected(
                crate::types::CardError::ChecksumFailed
            ))
        );
        assert!(processor.ledger().is_empty());

        // The rejected attempt consumed no id: the next payment gets the base id
        let record = processor.process_cash(dec!(10.00), dec!(10.00)).unwrap();
        assert_eq!(record.id, IdGenerator::BASE);
    }

    #[tokio::test]
    async fn test_card_decline_commits_failed_record() {
        let processor =
            processor_with(SimulatedGateway::declining(), SimulatedGateway::approving());

        let record = processor
            .process_card(dec!(100.00), valid_card(), "key-1")
            .await
            .unwrap();

        assert_eq!(record.status, PaymentState::Failed);
        assert_eq!(record.failure, Some(FailureReason::Declined));
        assert_eq!(record.authorization_code, None);
        assert_eq!(processor.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_mobile_payment_completes() {
        let processor = approving_processor();

        let record = processor
            .process_mobile(dec!(200.00), "254727951049", "key-1")
            .await
            .unwrap();

        assert_eq!(record.method, PaymentMethod::Mobile);
        assert_eq!(record.status, PaymentState::Completed);
        assert!(record.authorization_code.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_gateway_times_out_into_failed_record() {
        let processor =
            processor_with(SimulatedGateway::approving(), SimulatedGateway::stalled());

        let record = processor
            .process_mobile(dec!(200.00), "254727951049", "key-1")
            .await
            .unwrap();

        assert_eq!(record.status, PaymentState::Failed);
        assert_eq!(record.failure, Some(FailureReason::Timeout));
        // The terminal record is the only thing that ever reached the ledger
        assert_eq!(processor.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_replayed_key_returns_committed_record_without_recharging() {
        let processor = approving_processor();

        let first = processor
            .process_card(dec!(1200.00), valid_card(), "retry-key")
            .await
            .unwrap();
        let second = processor
            .process_card(dec!(1200.00), valid_card(), "retry-key")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(processor.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_replayed_key_with_different_amount_conflicts() {
        let processor = approving_processor();

        processor
            .process_card(dec!(1200.00), valid_card(), "retry-key")
            .await
            .unwrap();
        let result = processor
            .process_card(dec!(900.00), valid_card(), "retry-key")
            .await;

        assert_eq!(
            result,
            Err(PaymentError::idempotency_conflict("retry-key"))
        );
        assert_eq!(processor.ledger().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_commit_distinct_records() {
        let processor = approving_processor();

        let first = processor
            .process_mobile(dec!(200.00), "254727951049", "key-a")
            .await
            .unwrap();
        let second = processor
            .process_mobile(dec!(200.00), "254727951049", "key-b")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(processor.ledger().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_payment_binds_its_key() {
        let processor =
            processor_with(SimulatedGateway::approving(), SimulatedGateway::declining());

        let first = processor
            .process_mobile(dec!(200.00), "254727951049", "key-1")
            .await
            .unwrap();
        assert_eq!(first.status, PaymentState::Failed);

        // Replaying the key reports the decline; a retry needs a fresh key
        let second = processor
            .process_mobile(dec!(200.00), "254727951049", "key-1")
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(processor.ledger().len(), 1);
    }
}
