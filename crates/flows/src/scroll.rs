//! Pay-per-scroll: one micropayment per newly revealed content section.

use super::guard::InFlight;
use super::{FlowContext, FlowError, Notification};
use chrono::Utc;
use lnpay_core::models::{NewTransaction, ScrollPayment, Transaction, TransactionType};
use provider::{KeysendArgs, KEYSEND_MESSAGE_RECORD};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, Duration};

/// Node that receives the demo's section payments.
pub const DEMO_NODE_PUBKEY: &str =
    "023d70f2f76d283c6c4e58109ee3ad2031b727fdd507a8d6059ef8c779c5d357aa";

const TEST_MODE_PREFIX: &str = "[test mode] ";

#[derive(Debug, Clone)]
pub struct ScrollConfig {
    pub section_count: u32,
    pub sats_per_section: u64,
    pub destination: String,
    /// Simulated settlement time when test mode replaces the wallet.
    pub test_mode_delay: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            section_count: 5,
            sats_per_section: 1,
            destination: DEMO_NODE_PUBKEY.to_string(),
            test_mode_delay: Duration::from_secs(1),
        }
    }
}

/// Geometry of the scrolled container at the time of one scroll event.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollViewport {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollViewport {
    pub fn progress_percent(&self) -> f64 {
        let range = self.scroll_height - self.client_height;
        if range <= 0.0 {
            return 100.0;
        }
        (self.scroll_top / range * 100.0).min(100.0)
    }

    /// 1-based index of the section at the bottom edge of the viewport, or
    /// `None` when that falls outside `1..=section_count`.
    ///
    /// Jumping past several sections in one event yields only the furthest;
    /// the skipped ones are never charged.
    pub fn section(&self, section_count: u32) -> Option<u32> {
        if section_count == 0 {
            return None;
        }
        let section_height = self.scroll_height / f64::from(section_count);
        if section_height <= 0.0 {
            return None;
        }
        let index = ((self.scroll_top + self.client_height) / section_height).floor();
        if index >= 1.0 && index <= f64::from(section_count) {
            Some(index as u32)
        } else {
            None
        }
    }
}

#[derive(Default)]
struct ScrollState {
    active: bool,
    test_mode: bool,
    paid: BTreeSet<u32>,
    total_paid: u64,
    progress: f64,
    payments: Vec<ScrollPayment>,
    /// Bumped on every reset so late settlements can tell they are stale.
    epoch: u64,
}

impl ScrollState {
    fn reset(&mut self) {
        self.active = false;
        self.paid.clear();
        self.total_paid = 0;
        self.progress = 0.0;
        self.payments.clear();
        self.epoch += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollStatus {
    pub active: bool,
    pub test_mode: bool,
    pub unlocked_sections: Vec<u32>,
    pub section_count: u32,
    pub sats_per_section: u64,
    pub total_paid: u64,
    pub progress_percent: f64,
    pub payments: Vec<ScrollPayment>,
    pub paying: bool,
}

/// Outcome of a scroll event that paid for a section.
#[derive(Debug, Clone, Serialize)]
pub struct ScrollCharge {
    pub payment: ScrollPayment,
    pub transaction: Transaction,
    pub notification: Notification,
}

pub struct ScrollTrigger {
    ctx: FlowContext,
    config: ScrollConfig,
    state: Mutex<ScrollState>,
    in_flight: InFlight,
}

impl ScrollTrigger {
    pub fn new(ctx: FlowContext, config: ScrollConfig) -> Self {
        Self {
            ctx,
            config,
            state: Mutex::new(ScrollState::default()),
            in_flight: InFlight::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScrollState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn status(&self) -> ScrollStatus {
        let state = self.lock();
        ScrollStatus {
            active: state.active,
            test_mode: state.test_mode,
            unlocked_sections: state.paid.iter().copied().collect(),
            section_count: self.config.section_count,
            sats_per_section: self.config.sats_per_section,
            total_paid: state.total_paid,
            progress_percent: state.progress,
            payments: state.payments.clone(),
            paying: self.in_flight.is_active(),
        }
    }

    /// Flips the trigger on or off and returns the new state. Turning it on
    /// outside test mode connects the wallet first.
    pub async fn toggle(&self) -> Result<bool, FlowError> {
        let test_mode = self.lock().test_mode;
        if !test_mode && !self.ctx.wallet.is_connected() {
            self.ctx.wallet.connect().await.map_err(FlowError::Wallet)?;
            self.lock().active = true;
            tracing::info!("pay-per-scroll activated after connecting wallet");
            return Ok(true);
        }

        let mut state = self.lock();
        state.active = !state.active;
        tracing::info!(active = state.active, test_mode, "pay-per-scroll toggled");
        Ok(state.active)
    }

    /// Switching modes starts the demo over.
    pub fn set_test_mode(&self, enabled: bool) {
        let mut state = self.lock();
        if state.test_mode != enabled {
            state.reset();
            state.test_mode = enabled;
            tracing::info!(test_mode = enabled, "pay-per-scroll mode changed");
        }
    }

    /// Clears unlocked sections and totals. The ledger is left alone.
    pub fn reset(&self) {
        self.lock().reset();
        tracing::info!("pay-per-scroll demo reset");
    }

    /// Handles one scroll event, paying for the revealed section if it is
    /// new. Events that cannot charge anything resolve to `Ok(None)`.
    pub async fn on_scroll(
        &self,
        viewport: ScrollViewport,
    ) -> Result<Option<ScrollCharge>, FlowError> {
        let test_mode = {
            let mut state = self.lock();
            if !state.active {
                return Ok(None);
            }
            state.progress = viewport.progress_percent();
            state.test_mode
        };
        let Some(section) = viewport.section(self.config.section_count) else {
            return Ok(None);
        };
        if !test_mode && !self.ctx.wallet.is_connected() {
            return Ok(None);
        }
        let Some(_guard) = self.in_flight.try_begin() else {
            return Ok(None);
        };
        let epoch = {
            let state = self.lock();
            if !state.active || state.paid.contains(&section) {
                return Ok(None);
            }
            state.epoch
        };

        let amount = self.config.sats_per_section;
        let prefix = if test_mode { TEST_MODE_PREFIX } else { "" };
        let settled = if test_mode {
            self.simulate_payment().await
        } else {
            self.pay_section(section).await
        };

        match settled {
            Ok(preimage) => {
                let tx = self.ctx.ledger.add(
                    NewTransaction::success(
                        TransactionType::PayPerScroll,
                        amount,
                        format!("{prefix}Paid {amount} sats for content section {section}"),
                    )
                    .with_preimage(preimage),
                );
                let payment = ScrollPayment {
                    section,
                    amount,
                    timestamp: Utc::now().timestamp_millis(),
                };

                let mut state = self.lock();
                if state.epoch == epoch {
                    state.paid.insert(section);
                    state.total_paid += amount;
                    state.payments.push(payment.clone());
                } else {
                    tracing::debug!(section, "demo reset while paying; section not unlocked");
                }
                drop(state);

                Ok(Some(ScrollCharge {
                    payment,
                    transaction: tx,
                    notification: Notification::success(
                        "Section Unlocked",
                        format!("Paid {amount} sats to unlock section {section}"),
                    ),
                }))
            }
            Err(e) => {
                tracing::warn!(section, error = %e, "section payment failed");
                let tx = self.ctx.ledger.add(NewTransaction::failed(
                    TransactionType::PayPerScroll,
                    amount,
                    format!("{prefix}Failed payment for content section {section}"),
                    e.to_string(),
                ));
                Err(FlowError::rejected("Payment Failed", e.to_string(), tx))
            }
        }
    }

    async fn pay_section(&self, section: u32) -> anyhow::Result<String> {
        let args = KeysendArgs::new(self.config.destination.clone(), self.config.sats_per_section)
            .with_record(
                KEYSEND_MESSAGE_RECORD,
                format!("Paid for section {section} of the pay-per-scroll demo"),
            );
        Ok(self.ctx.wallet.keysend(args).await?.preimage)
    }

    async fn simulate_payment(&self) -> anyhow::Result<String> {
        sleep(self.config.test_mode_delay).await;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        Ok(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connected_context, idle_context};
    use ledger::TransactionLedger;
    use lnpay_core::models::TransactionStatus;
    use provider::mock::MockWallet;
    use provider::WalletAdapter;
    use std::sync::Arc;

    fn viewport(scroll_top: f64) -> ScrollViewport {
        ScrollViewport {
            scroll_top,
            client_height: 200.0,
            scroll_height: 1000.0,
        }
    }

    fn instant_config() -> ScrollConfig {
        ScrollConfig {
            test_mode_delay: Duration::ZERO,
            ..ScrollConfig::default()
        }
    }

    async fn active_trigger() -> (ScrollTrigger, FlowContext, Arc<MockWallet>) {
        let (ctx, wallet) = connected_context().await;
        let trigger = ScrollTrigger::new(ctx.clone(), instant_config());
        assert!(trigger.toggle().await.unwrap());
        (trigger, ctx, wallet)
    }

    async fn slow_trigger() -> (ScrollTrigger, FlowContext) {
        let wallet = MockWallet::with_options(Duration::from_millis(50), true);
        let adapter = WalletAdapter::probe(Some(wallet)).await;
        let ctx = FlowContext::new(adapter, Arc::new(TransactionLedger::in_memory()));
        let trigger = ScrollTrigger::new(ctx.clone(), instant_config());
        trigger.toggle().await.unwrap();
        (trigger, ctx)
    }

    #[test]
    fn section_index_tracks_bottom_edge() {
        assert_eq!(viewport(0.0).section(5), Some(1));
        assert_eq!(viewport(600.0).section(5), Some(4));
        assert_eq!(viewport(800.0).section(5), Some(5));
        assert_eq!(viewport(1200.0).section(5), None);

        let short = ScrollViewport {
            scroll_top: 0.0,
            client_height: 100.0,
            scroll_height: 1000.0,
        };
        assert_eq!(short.section(5), None);
        assert_eq!(short.section(0), None);
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(viewport(400.0).progress_percent(), 50.0);
        assert_eq!(viewport(900.0).progress_percent(), 100.0);
        let fits = ScrollViewport {
            scroll_top: 0.0,
            client_height: 500.0,
            scroll_height: 400.0,
        };
        assert_eq!(fits.progress_percent(), 100.0);
    }

    #[tokio::test]
    async fn jump_charges_only_the_furthest_section_once() {
        let (trigger, ctx, wallet) = active_trigger().await;

        let charge = trigger.on_scroll(viewport(600.0)).await.unwrap().unwrap();
        assert_eq!(charge.payment.section, 4);
        assert_eq!(
            charge.transaction.description,
            "Paid 1 sats for content section 4"
        );
        assert_eq!(charge.notification.title, "Section Unlocked");

        assert!(trigger.on_scroll(viewport(600.0)).await.unwrap().is_none());
        assert!(trigger.on_scroll(viewport(650.0)).await.unwrap().is_none());

        let sent = wallet.keysends();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, DEMO_NODE_PUBKEY);
        assert_eq!(
            sent[0].custom_records.get(KEYSEND_MESSAGE_RECORD).map(String::as_str),
            Some("Paid for section 4 of the pay-per-scroll demo")
        );

        let status = trigger.status();
        assert_eq!(status.unlocked_sections, vec![4]);
        assert_eq!(status.total_paid, 1);
        assert_eq!(ctx.ledger.by_type(TransactionType::PayPerScroll).len(), 1);
    }

    #[tokio::test]
    async fn inactive_trigger_ignores_scrolling() {
        let (ctx, wallet) = connected_context().await;
        let trigger = ScrollTrigger::new(ctx.clone(), instant_config());

        assert!(trigger.on_scroll(viewport(600.0)).await.unwrap().is_none());
        assert_eq!(wallet.calls(), 0);
        assert!(ctx.ledger.is_empty());
    }

    #[tokio::test]
    async fn activation_connects_idle_wallet() {
        let (ctx, _wallet) = idle_context().await;
        let trigger = ScrollTrigger::new(ctx.clone(), instant_config());

        assert!(trigger.toggle().await.unwrap());
        assert!(ctx.wallet.is_connected());
        assert!(!trigger.toggle().await.unwrap());
    }

    #[tokio::test]
    async fn test_mode_never_touches_wallet() {
        let (ctx, wallet) = idle_context().await;
        let trigger = ScrollTrigger::new(ctx.clone(), instant_config());
        trigger.set_test_mode(true);
        assert!(trigger.toggle().await.unwrap());
        assert!(!ctx.wallet.is_connected());

        let charge = trigger.on_scroll(viewport(0.0)).await.unwrap().unwrap();
        assert_eq!(charge.payment.section, 1);
        assert!(charge.transaction.description.starts_with("[test mode] "));
        assert_eq!(charge.transaction.preimage.as_ref().map(String::len), Some(64));
        assert_eq!(wallet.calls(), 0);
    }

    #[tokio::test]
    async fn toggling_test_mode_resets_progress() {
        let (trigger, ctx, _wallet) = active_trigger().await;
        trigger.on_scroll(viewport(0.0)).await.unwrap();
        trigger.on_scroll(viewport(200.0)).await.unwrap();
        assert_eq!(trigger.status().unlocked_sections.len(), 2);

        trigger.set_test_mode(true);
        let status = trigger.status();
        assert!(status.test_mode);
        assert!(!status.active);
        assert!(status.unlocked_sections.is_empty());
        assert_eq!(status.total_paid, 0);
        assert!(status.payments.is_empty());
        // ledger history survives
        assert_eq!(ctx.ledger.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_events_charge_once() {
        let (trigger, ctx) = slow_trigger().await;

        let (a, b) = tokio::join!(
            trigger.on_scroll(viewport(600.0)),
            trigger.on_scroll(viewport(800.0))
        );
        let charged = [a.unwrap(), b.unwrap()]
            .into_iter()
            .flatten()
            .count();
        assert_eq!(charged, 1);
        assert_eq!(ctx.ledger.len(), 1);
        assert!(!trigger.status().paying);
    }

    #[tokio::test]
    async fn failed_section_stays_locked_and_is_recorded() {
        let (trigger, ctx, wallet) = active_trigger().await;
        wallet.fail_with("insufficient balance");

        let err = trigger.on_scroll(viewport(600.0)).await.unwrap_err();
        let tx = err.transaction().unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.description, "Failed payment for content section 4");
        assert!(trigger.status().unlocked_sections.is_empty());

        wallet.recover();
        let charge = trigger.on_scroll(viewport(600.0)).await.unwrap();
        assert!(charge.is_some());
        assert_eq!(ctx.ledger.len(), 2);
    }

    #[tokio::test]
    async fn reset_during_payment_discards_unlock() {
        let (trigger, ctx) = slow_trigger().await;

        let (charge, _) = tokio::join!(trigger.on_scroll(viewport(600.0)), async {
            sleep(Duration::from_millis(10)).await;
            trigger.reset();
        });
        assert!(charge.unwrap().is_some());

        let status = trigger.status();
        assert!(status.unlocked_sections.is_empty());
        assert_eq!(status.total_paid, 0);
        assert_eq!(ctx.ledger.len(), 1);
    }
}
