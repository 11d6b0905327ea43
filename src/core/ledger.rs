//! Append-only transaction ledger
//!
//! This module provides the TransactionLedger component: the system of record
//! for settled payments. Appending is the sole mutation — there is no update
//! or delete — so the history is auditable by construction.
//!
//! # Design
//!
//! Records are stored twice: an insertion-ordered `Vec` (behind an `RwLock`)
//! that backs ordered iteration, and a `DashMap` index keyed by payment id
//! that backs point lookups. Records are wrapped in `Arc` on append; every
//! read hands out a shared handle to the same immutable record, so nothing
//! can mutate a committed entry.
//!
//! # Thread Safety
//!
//! Appends are serialized by the write lock. Point lookups go through the
//! DashMap index and do not contend with appends; ordered reads take the read
//! lock briefly to snapshot and always observe a consistent prefix of the
//! history, never a partially constructed record.

use crate::types::{PaymentError, PaymentId, PaymentMethod, PaymentState, TransactionRecord};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Append-only store of terminal payment records
pub struct TransactionLedger {
    /// Records in insertion order
    records: RwLock<Vec<Arc<TransactionRecord>>>,

    /// Point-lookup index by payment id
    ///
    /// DashMap keeps id lookups off the insertion-order lock, so a reporting
    /// reader never blocks a terminal committing a sale.
    index: DashMap<PaymentId, Arc<TransactionRecord>>,
}

impl TransactionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        TransactionLedger {
            records: RwLock::new(Vec::new()),
            index: DashMap::new(),
        }
    }

    /// Append a terminal record
    ///
    /// # Arguments
    ///
    /// * `record` - The settled payment; its status must be terminal
    ///
    /// # Returns
    ///
    /// A shared handle to the committed record.
    ///
    /// # Errors
    ///
    /// * `PaymentError::NotTerminal` if the record's status is not terminal
    /// * `PaymentError::DuplicateRecord` if the id is already in the ledger
    pub fn append(&self, record: TransactionRecord) -> Result<Arc<TransactionRecord>, PaymentError> {
        if !record.status.is_terminal() {
            return Err(PaymentError::not_terminal(record.id, record.status));
        }

        let record = Arc::new(record);
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if self.index.contains_key(&record.id) {
            return Err(PaymentError::duplicate_record(record.id));
        }
        records.push(Arc::clone(&record));
        self.index.insert(record.id, Arc::clone(&record));
        debug!(id = record.id, status = %record.status, "record appended to ledger");
        Ok(record)
    }

    /// Look up a record by payment id
    pub fn find_by_id(&self, id: PaymentId) -> Option<Arc<TransactionRecord>> {
        self.index.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Iterate over all records in insertion order
    ///
    /// The iterator is backed by a snapshot taken at the time of the call:
    /// it is finite, restartable (calling `all` again on an unchanged ledger
    /// yields the same sequence), and unaffected by concurrent appends.
    pub fn all(&self) -> impl Iterator<Item = Arc<TransactionRecord>> {
        self.snapshot().into_iter()
    }

    /// Records paid with the given method, in insertion order
    pub fn by_method(&self, method: PaymentMethod) -> Vec<Arc<TransactionRecord>> {
        self.snapshot()
            .into_iter()
            .filter(|record| record.method == method)
            .collect()
    }

    /// Records with the given terminal status, in insertion order
    pub fn by_status(&self, status: PaymentState) -> Vec<Arc<TransactionRecord>> {
        self.snapshot()
            .into_iter()
            .filter(|record| record.status == status)
            .collect()
    }

    /// Records created within `[from, to]` inclusive, in insertion order
    pub fn between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<Arc<TransactionRecord>> {
        self.snapshot()
            .into_iter()
            .filter(|record| record.created_at >= from && record.created_at <= to)
            .collect()
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the ledger holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<TransactionRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for TransactionLedger {
    fn default() -> Self {
        Self::new()
    }
}
