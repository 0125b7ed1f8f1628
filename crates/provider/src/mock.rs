use super::{
    GetInfoResponse, KeysendArgs, MakeInvoiceResponse, RequestInvoiceArgs, SendPaymentResponse,
    WalletProvider,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

const BECH32_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// In-process wallet that settles everything after a short delay.
///
/// Failures can be injected with [`MockWallet::fail_with`] to exercise
/// rejection paths without a funded node.
pub struct MockWallet {
    latency: Duration,
    enabled: AtomicBool,
    pubkey: String,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
    keysends: Mutex<Vec<KeysendArgs>>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Self::with_options(Duration::from_millis(200), false)
    }

    /// No simulated latency; handy in tests.
    pub fn instant() -> Arc<Self> {
        Self::with_options(Duration::ZERO, false)
    }

    pub fn with_options(latency: Duration, auto_enable: bool) -> Arc<Self> {
        let mut key = [0u8; 32];
        rand::thread_rng().fill(&mut key);
        Arc::new(Self {
            latency,
            enabled: AtomicBool::new(auto_enable),
            pubkey: format!("02{}", hex::encode(key)),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
            keysends: Mutex::new(Vec::new()),
        })
    }

    /// Every following wallet call is rejected with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.lock_failure() = Some(reason.into());
    }

    pub fn recover(&self) {
        *self.lock_failure() = None;
    }

    /// Number of payment, invoice and keysend calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keysends(&self) -> Vec<KeysendArgs> {
        self.keysends
            .lock()
            .map(|k| k.clone())
            .unwrap_or_default()
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn settle(&self) -> Result<()> {
        // simulate network latency
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        let failure = self.lock_failure().clone();
        if let Some(reason) = failure {
            bail!("{reason}");
        }
        Ok(())
    }

    fn preimage() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        hex::encode(bytes)
    }

    fn payment_request(amount_sats: u64) -> String {
        let mut rng = rand::thread_rng();
        let data: String = (0..180)
            .map(|_| BECH32_CHARSET[rng.gen_range(0..BECH32_CHARSET.len())] as char)
            .collect();
        // nano-bitcoin is a tenth of a satoshi
        format!("lnbc{}n1{data}", amount_sats.saturating_mul(10))
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn enable(&self) -> Result<()> {
        self.settle().await?;
        self.enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_info(&self) -> Result<GetInfoResponse> {
        self.settle().await?;
        Ok(GetInfoResponse {
            alias: Some("mock-wallet".to_string()),
            pubkey: Some(self.pubkey.clone()),
            network: Some("regtest".to_string()),
            num_peers: Some(3),
            block_height: Some(840_000),
            synced_to_chain: Some(true),
            ..Default::default()
        })
    }

    async fn send_payment(&self, payment_request: &str) -> Result<SendPaymentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.settle().await?;
        tracing::debug!(payment_request = %payment_request, "mock wallet paid invoice");
        Ok(SendPaymentResponse {
            preimage: Self::preimage(),
        })
    }

    async fn make_invoice(&self, args: RequestInvoiceArgs) -> Result<MakeInvoiceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.settle().await?;
        let amount = args.amount.or(args.default_amount).unwrap_or(0);
        Ok(MakeInvoiceResponse {
            payment_request: Self::payment_request(amount),
        })
    }

    async fn keysend(&self, args: KeysendArgs) -> Result<SendPaymentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.settle().await?;
        if let Ok(mut log) = self.keysends.lock() {
            log.push(args);
        }
        Ok(SendPaymentResponse {
            preimage: Self::preimage(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnpay_core::parsing::invoice_amount_sats;

    #[tokio::test]
    async fn invoices_encode_requested_amount() {
        let wallet = MockWallet::instant();
        let invoice = wallet
            .make_invoice(RequestInvoiceArgs::fixed(21, "coffee"))
            .await
            .unwrap();
        assert_eq!(invoice_amount_sats(&invoice.payment_request), Some(21));
        assert_eq!(wallet.calls(), 1);
    }

    #[tokio::test]
    async fn injected_failure_rejects_until_recovered() {
        let wallet = MockWallet::instant();
        wallet.fail_with("insufficient balance");
        let err = wallet.send_payment("lnbc1x").await.unwrap_err();
        assert_eq!(err.to_string(), "insufficient balance");

        wallet.recover();
        let paid = wallet.send_payment("lnbc1x").await.unwrap();
        assert_eq!(paid.preimage.len(), 64);
        assert_eq!(wallet.calls(), 2);
    }

    #[tokio::test]
    async fn enable_flips_enabled_flag() {
        let wallet = MockWallet::instant();
        assert!(!wallet.is_enabled().await);
        wallet.enable().await.unwrap();
        assert!(wallet.is_enabled().await);
    }
}
