use super::guard::InFlight;
use super::{FlowContext, FlowError, FlowReceipt, Notification};
use lnpay_core::models::{NewTransaction, TransactionType};
use lnpay_core::parsing::invoice_amount_sats;
use lnpay_core::validation::validate_invoice;

/// Pays a BOLT11 invoice through the connected wallet.
pub struct SendPaymentFlow {
    ctx: FlowContext,
    in_flight: InFlight,
}

impl SendPaymentFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self {
            ctx,
            in_flight: InFlight::default(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    pub async fn pay(&self, invoice: &str) -> Result<FlowReceipt, FlowError> {
        let invoice = validate_invoice(invoice)?;
        self.ctx.require_connected()?;
        let _guard = self.in_flight.try_begin().ok_or(FlowError::Busy)?;

        // amountless invoices are recorded as 0
        let amount = invoice_amount_sats(&invoice).unwrap_or(0);

        match self.ctx.wallet.send_payment(&invoice).await {
            Ok(resp) => {
                let tx = self.ctx.ledger.add(
                    NewTransaction::success(
                        TransactionType::Payment,
                        amount,
                        "Payment sent via Lightning invoice",
                    )
                    .with_preimage(resp.preimage)
                    .with_payment_request(invoice),
                );
                Ok(FlowReceipt {
                    transaction: tx,
                    notification: Notification::success(
                        "Payment Sent",
                        "Lightning payment was successful",
                    ),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "invoice payment failed");
                let tx = self.ctx.ledger.add(
                    NewTransaction::failed(
                        TransactionType::Payment,
                        amount,
                        "Failed Lightning payment",
                        e.to_string(),
                    )
                    .with_payment_request(invoice),
                );
                Err(FlowError::rejected("Payment Failed", e.to_string(), tx))
            }
        }
    }
}
