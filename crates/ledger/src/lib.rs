mod store;

pub use store::{KvStore, MemoryStore, SledStore};

use chrono::Utc;
use lnpay_core::models::{NewTransaction, Transaction, TransactionType};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage key holding the JSON encoded transaction list.
pub const LEDGER_KEY: &str = "lightning-txs";

/// Default page size for [`TransactionLedger::recent`] callers.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Append-only history of attempted payment operations.
///
/// Records are kept newest-first in insertion order and written through to
/// the [`KvStore`] after every mutation. Concurrent writers in separate
/// processes are last-writer-wins.
pub struct TransactionLedger {
    store: Arc<dyn KvStore>,
    transactions: RwLock<Vec<Transaction>>,
}

impl TransactionLedger {
    /// Restores the ledger from `store`. Unreadable or malformed data yields
    /// an empty ledger instead of an error.
    pub fn open(store: Arc<dyn KvStore>) -> Self {
        let transactions = match store.get(LEDGER_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Transaction>>(&bytes) {
                Ok(txs) => txs,
                Err(e) => {
                    tracing::error!(error = %e, "failed to parse stored transactions");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "failed to read stored transactions");
                Vec::new()
            }
        };
        tracing::debug!(count = transactions.len(), "transaction ledger loaded");

        Self {
            store,
            transactions: RwLock::new(transactions),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Transaction>> {
        self.transactions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Transaction>> {
        self.transactions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Stamps `id` and `timestamp`, prepends the record and persists.
    pub fn add(&self, new_tx: NewTransaction) -> Transaction {
        let mut txs = self.write();
        let id = unique_id(&txs);
        let tx = new_tx.into_transaction(id, Utc::now().timestamp_millis());
        txs.insert(0, tx.clone());
        self.persist(&txs);

        tracing::info!(
            transaction_id = %tx.id,
            kind = %tx.kind,
            amount = tx.amount,
            status = ?tx.status,
            "transaction recorded"
        );
        tx
    }

    pub fn clear(&self) {
        let mut txs = self.write();
        txs.clear();
        self.persist(&txs);
        tracing::info!("transaction history cleared");
    }

    /// All records in storage order (newest insert first).
    pub fn transactions(&self) -> Vec<Transaction> {
        self.read().clone()
    }

    pub fn by_type(&self, kind: TransactionType) -> Vec<Transaction> {
        self.read()
            .iter()
            .filter(|tx| tx.kind == kind)
            .cloned()
            .collect()
    }

    /// Up to `limit` records sorted by timestamp, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Transaction> {
        newest_first(self.transactions(), limit)
    }

    pub fn recent_by_type(&self, kind: TransactionType, limit: usize) -> Vec<Transaction> {
        newest_first(self.by_type(kind), limit)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn persist(&self, txs: &[Transaction]) {
        let result = serde_json::to_vec(txs)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.store.set(LEDGER_KEY, &bytes));
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to persist transactions");
        }
    }
}

fn newest_first(mut txs: Vec<Transaction>, limit: usize) -> Vec<Transaction> {
    txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    txs.truncate(limit);
    txs
}

fn unique_id(existing: &[Transaction]) -> String {
    use rand::{distributions::Alphanumeric, Rng};

    let taken: HashSet<&str> = existing.iter().map(|tx| tx.id.as_str()).collect();
    loop {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        if !taken.contains(id.as_str()) {
            return id;
        }
    }
}
