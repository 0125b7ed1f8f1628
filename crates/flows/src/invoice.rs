use super::guard::InFlight;
use super::{FlowContext, FlowError, Notification};
use lnpay_core::models::{NewTransaction, Transaction, TransactionStatus, TransactionType};
use lnpay_core::parsing::lightning_uri;
use lnpay_core::validation::parse_amount;
use provider::RequestInvoiceArgs;
use serde::Serialize;

pub const DEFAULT_INVOICE_MEMO: &str = "Lightning Invoice";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReceipt {
    pub transaction: Transaction,
    pub payment_request: String,
    /// `lightning:` URI for QR rendering.
    pub uri: String,
    pub notification: Notification,
}

/// Asks the wallet for an invoice so someone else can pay us.
pub struct InvoiceFlow {
    ctx: FlowContext,
    in_flight: InFlight,
}

impl InvoiceFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self {
            ctx,
            in_flight: InFlight::default(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    pub async fn create(
        &self,
        amount: &str,
        memo: Option<&str>,
    ) -> Result<InvoiceReceipt, FlowError> {
        let amount = parse_amount(amount)?;
        self.ctx.require_connected()?;
        let _guard = self.in_flight.try_begin().ok_or(FlowError::Busy)?;

        let memo = memo.map(str::trim).filter(|m| !m.is_empty());
        let args = RequestInvoiceArgs::fixed(amount, memo.unwrap_or(DEFAULT_INVOICE_MEMO));
        let description = memo.unwrap_or("Created Lightning invoice").to_string();

        match self.ctx.wallet.make_invoice(args).await {
            Ok(resp) => {
                // nothing observes settlement, so the record stays pending
                let tx = self.ctx.ledger.add(
                    NewTransaction::new(
                        TransactionType::Invoice,
                        amount,
                        description,
                        TransactionStatus::Pending,
                    )
                    .with_payment_request(resp.payment_request.clone()),
                );
                Ok(InvoiceReceipt {
                    transaction: tx,
                    uri: lightning_uri(&resp.payment_request),
                    payment_request: resp.payment_request,
                    notification: Notification::success(
                        "Invoice Created",
                        format!("Created an invoice for {amount} sats"),
                    ),
                })
            }
            Err(e) => {
                tracing::warn!(amount, error = %e, "invoice creation failed");
                let tx = self.ctx.ledger.add(NewTransaction::failed(
                    TransactionType::Invoice,
                    amount,
                    description,
                    e.to_string(),
                ));
                Err(FlowError::rejected("Invoice Generation Failed", e.to_string(), tx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connected_context, idle_context, slow_context};
    use lnpay_core::parsing::invoice_amount_sats;
    use lnpay_core::validation::ValidationError;

    #[tokio::test]
    async fn created_invoice_is_pending_and_uri_wrapped() {
        let (ctx, _wallet) = connected_context().await;
        let receipt = InvoiceFlow::new(ctx.clone())
            .create("1500", Some("coffee"))
            .await
            .unwrap();

        assert_eq!(receipt.transaction.status, TransactionStatus::Pending);
        assert_eq!(receipt.transaction.description, "coffee");
        assert_eq!(invoice_amount_sats(&receipt.payment_request), Some(1500));
        assert_eq!(receipt.uri, format!("lightning:{}", receipt.payment_request));
        assert_eq!(
            receipt.transaction.payment_request.as_deref(),
            Some(receipt.payment_request.as_str())
        );
        assert_eq!(receipt.notification.description, "Created an invoice for 1500 sats");
        assert_eq!(ctx.ledger.by_type(TransactionType::Invoice).len(), 1);
    }

    #[tokio::test]
    async fn blank_memo_uses_default_description() {
        let (ctx, _wallet) = connected_context().await;
        let receipt = InvoiceFlow::new(ctx).create("10", Some("  ")).await.unwrap();
        assert_eq!(receipt.transaction.description, "Created Lightning invoice");
    }

    #[tokio::test]
    async fn amount_is_checked_before_connection() {
        let (ctx, wallet) = idle_context().await;
        let flow = InvoiceFlow::new(ctx.clone());

        let err = flow.create("abc", None).await.unwrap_err();
        assert!(matches!(err, FlowError::Invalid(ValidationError::InvalidAmount)));
        assert!(matches!(
            flow.create("10", None).await.unwrap_err(),
            FlowError::Wallet(_)
        ));
        assert_eq!(wallet.calls(), 0);
        assert!(ctx.ledger.is_empty());
    }

    #[tokio::test]
    async fn wallet_failure_is_recorded() {
        let (ctx, wallet) = connected_context().await;
        wallet.fail_with("invoice creation disabled");
        let err = InvoiceFlow::new(ctx.clone())
            .create("10", None)
            .await
            .unwrap_err();

        assert_eq!(err.notification().title, "Invoice Generation Failed");
        assert_eq!(err.transaction().unwrap().status, TransactionStatus::Failed);
        assert_eq!(ctx.ledger.len(), 1);
    }

    #[tokio::test]
    async fn second_request_while_generating_is_busy() {
        let (ctx, wallet) = slow_context().await;
        let flow = InvoiceFlow::new(ctx.clone());

        let (a, b) = tokio::join!(flow.create("10", None), flow.create("20", None));
        assert!(a.is_ok());
        assert!(matches!(b, Err(FlowError::Busy)));
        assert_eq!(wallet.calls(), 1);
        assert_eq!(ctx.ledger.len(), 1);
        assert!(!flow.is_processing());
    }
}
