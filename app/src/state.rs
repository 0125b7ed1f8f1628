use config::AppConfig;
use flows::{
    FlowContext, InvoiceFlow, KeysendFlow, LightningAddressFlow, ScrollConfig, ScrollTrigger,
    SendPaymentFlow,
};
use ledger::TransactionLedger;
use lnpay_core::currency::Currency;
use provider::lnurl::LnurlClient;
use provider::WalletAdapter;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Everything the HTTP handlers share: one wallet, one ledger and one
/// instance of each flow so the in-flight guards are process-wide.
pub struct AppState {
    pub wallet: Arc<WalletAdapter>,
    pub ledger: Arc<TransactionLedger>,
    pub send: SendPaymentFlow,
    pub keysend: KeysendFlow,
    pub invoice: InvoiceFlow,
    pub address: LightningAddressFlow,
    pub scroll: ScrollTrigger,
    currency: RwLock<Currency>,
}

impl AppState {
    pub fn new(
        ctx: FlowContext,
        lnurl: LnurlClient,
        scroll: ScrollConfig,
        currency: Currency,
    ) -> Self {
        Self {
            wallet: ctx.wallet.clone(),
            ledger: ctx.ledger.clone(),
            send: SendPaymentFlow::new(ctx.clone()),
            keysend: KeysendFlow::new(ctx.clone()),
            invoice: InvoiceFlow::new(ctx.clone()),
            address: LightningAddressFlow::new(ctx.clone(), lnurl),
            scroll: ScrollTrigger::new(ctx, scroll),
            currency: RwLock::new(currency),
        }
    }

    pub fn from_config(
        cfg: &AppConfig,
        wallet: Arc<WalletAdapter>,
        ledger: Arc<TransactionLedger>,
    ) -> Self {
        let currency: Currency = cfg.display.currency.parse().unwrap_or_else(|e: String| {
            tracing::warn!(error = %e, "falling back to default display currency");
            Currency::default()
        });
        let scroll = ScrollConfig {
            section_count: cfg.scroll.section_count,
            sats_per_section: cfg.scroll.sats_per_section,
            destination: cfg.scroll.destination.clone(),
            test_mode_delay: Duration::from_millis(cfg.scroll.test_mode_delay_ms),
        };
        Self::new(
            FlowContext::new(wallet, ledger),
            LnurlClient::with_scheme(cfg.lnurl.scheme.clone()),
            scroll,
            currency,
        )
    }

    pub fn currency(&self) -> Currency {
        *self.currency.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_currency(&self, currency: Currency) {
        *self.currency.write().unwrap_or_else(|e| e.into_inner()) = currency;
        tracing::info!(%currency, "display currency changed");
    }
}
