use super::guard::InFlight;
use super::{FlowContext, FlowError, FlowReceipt, Notification};
use lnpay_core::models::{NewTransaction, TransactionType};
use lnpay_core::validation::validate_lightning_address;
use provider::lnurl::LnurlClient;

/// Pays a `user@domain` Lightning Address: resolve, fetch an invoice, pay it.
pub struct LightningAddressFlow {
    ctx: FlowContext,
    lnurl: LnurlClient,
    in_flight: InFlight,
}

impl LightningAddressFlow {
    pub fn new(ctx: FlowContext, lnurl: LnurlClient) -> Self {
        Self {
            ctx,
            lnurl,
            in_flight: InFlight::default(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    pub async fn pay(&self, address: &str, amount: &str) -> Result<FlowReceipt, FlowError> {
        let (address, amount) = validate_lightning_address(address, amount)?;
        self.ctx.require_connected()?;
        let _guard = self.in_flight.try_begin().ok_or(FlowError::Busy)?;

        let invoice = match self.lnurl.request_invoice(&address, amount).await {
            Ok(invoice) => invoice,
            Err(e) if e.is_out_of_bounds() => {
                tracing::info!(address = %address, amount, error = %e, "amount out of bounds");
                return Err(FlowError::OutOfBounds(e));
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "address resolution failed");
                let tx = self.ctx.ledger.add(NewTransaction::failed(
                    TransactionType::LightningAddress,
                    amount,
                    format!("Failed payment to {address}"),
                    e.to_string(),
                ));
                return Err(FlowError::rejected("Payment Failed", e.to_string(), tx));
            }
        };

        match self.ctx.wallet.send_payment(&invoice).await {
            Ok(resp) => {
                let tx = self.ctx.ledger.add(
                    NewTransaction::success(
                        TransactionType::LightningAddress,
                        amount,
                        format!("Payment to {address}"),
                    )
                    .with_preimage(resp.preimage)
                    .with_payment_request(invoice),
                );
                Ok(FlowReceipt {
                    transaction: tx,
                    notification: Notification::success(
                        "Payment Sent",
                        format!("Successfully paid {amount} sats to {address}"),
                    ),
                })
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "address payment failed");
                let tx = self.ctx.ledger.add(
                    NewTransaction::failed(
                        TransactionType::LightningAddress,
                        amount,
                        format!("Failed payment to {address}"),
                        e.to_string(),
                    )
                    .with_payment_request(invoice),
                );
                Err(FlowError::rejected("Payment Failed", e.to_string(), tx))
            }
        }
    }
}
