//! User-facing payment operations.
//!
//! Every flow follows the same shape: validate the input, require a
//! connected wallet, make exactly one wallet call, record the settled
//! outcome in the ledger, and hand back a notification.

pub mod address;
pub mod guard;
pub mod invoice;
pub mod keysend;
pub mod notify;
pub mod scroll;
pub mod send;

pub use address::LightningAddressFlow;
pub use invoice::{InvoiceFlow, InvoiceReceipt};
pub use keysend::KeysendFlow;
pub use notify::{Notification, NotificationVariant};
pub use scroll::{ScrollCharge, ScrollConfig, ScrollStatus, ScrollTrigger, ScrollViewport};
pub use send::SendPaymentFlow;

use ledger::TransactionLedger;
use lnpay_core::models::Transaction;
use lnpay_core::validation::ValidationError;
use provider::lnurl::LnurlError;
use provider::{AdapterError, ConnectionState, WalletAdapter};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Shared handles every flow works against.
#[derive(Clone)]
pub struct FlowContext {
    pub wallet: Arc<WalletAdapter>,
    pub ledger: Arc<TransactionLedger>,
}

impl FlowContext {
    pub fn new(wallet: Arc<WalletAdapter>, ledger: Arc<TransactionLedger>) -> Self {
        Self { wallet, ledger }
    }

    fn require_connected(&self) -> Result<(), FlowError> {
        match self.wallet.state() {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Unavailable => Err(FlowError::Wallet(AdapterError::Unavailable)),
            _ => Err(FlowError::Wallet(AdapterError::NotConnected)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowReceipt {
    pub transaction: Transaction,
    pub notification: Notification,
}

#[derive(Debug, Clone, Error)]
pub enum FlowError {
    /// Rejected before any external call.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Wallet(AdapterError),
    #[error("A payment is already being processed")]
    Busy,
    /// Amount outside the bounds a Lightning Address advertises. Raised
    /// before an invoice is requested, so nothing is recorded.
    #[error(transparent)]
    OutOfBounds(LnurlError),
    /// The wallet or a remote service refused; the failure is in the ledger.
    #[error("{message}")]
    Rejected {
        title: &'static str,
        message: String,
        transaction: Option<Box<Transaction>>,
    },
}

impl FlowError {
    pub fn notification(&self) -> Notification {
        match self {
            Self::Invalid(e) => Notification::error(e.title(), e.to_string()),
            Self::Wallet(AdapterError::Unavailable) => {
                Notification::error("Wallet Unavailable", self.to_string())
            }
            Self::Wallet(AdapterError::NotConnected) => {
                Notification::error("Not Connected", self.to_string())
            }
            Self::Wallet(_) => Notification::error("Connection Failed", self.to_string()),
            Self::Busy => Notification::error("Payment In Progress", self.to_string()),
            Self::OutOfBounds(_) => Notification::error("Invalid Amount", self.to_string()),
            Self::Rejected { title, message, .. } => Notification::error(*title, message.clone()),
        }
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Rejected { transaction, .. } => transaction.as_deref(),
            _ => None,
        }
    }

    fn rejected(title: &'static str, message: impl Into<String>, transaction: Transaction) -> Self {
        Self::Rejected {
            title,
            message: message.into(),
            transaction: Some(Box::new(transaction)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use provider::mock::MockWallet;
    use std::time::Duration;

    pub async fn connected_context() -> (FlowContext, Arc<MockWallet>) {
        let wallet = MockWallet::instant();
        let adapter = WalletAdapter::probe(Some(wallet.clone())).await;
        adapter.connect().await.unwrap();
        let ctx = FlowContext::new(adapter, Arc::new(TransactionLedger::in_memory()));
        (ctx, wallet)
    }

    /// Connected wallet that takes 50ms to settle each call.
    pub async fn slow_context() -> (FlowContext, Arc<MockWallet>) {
        let wallet = MockWallet::with_options(Duration::from_millis(50), true);
        let adapter = WalletAdapter::probe(Some(wallet.clone())).await;
        let ctx = FlowContext::new(adapter, Arc::new(TransactionLedger::in_memory()));
        (ctx, wallet)
    }

    pub async fn idle_context() -> (FlowContext, Arc<MockWallet>) {
        let wallet = MockWallet::instant();
        let adapter = WalletAdapter::probe(Some(wallet.clone())).await;
        let ctx = FlowContext::new(adapter, Arc::new(TransactionLedger::in_memory()));
        (ctx, wallet)
    }
}
