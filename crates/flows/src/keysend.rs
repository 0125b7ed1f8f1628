use super::guard::InFlight;
use super::{FlowContext, FlowError, FlowReceipt, Notification};
use lnpay_core::models::{NewTransaction, TransactionType};
use lnpay_core::parsing::format_pubkey;
use lnpay_core::validation::validate_keysend;
use provider::{KeysendArgs, KEYSEND_MESSAGE_RECORD};

const PUBKEY_DISPLAY_CHARS: usize = 12;

/// Direct payment to a node pubkey, no invoice required.
pub struct KeysendFlow {
    ctx: FlowContext,
    in_flight: InFlight,
}

impl KeysendFlow {
    pub fn new(ctx: FlowContext) -> Self {
        Self {
            ctx,
            in_flight: InFlight::default(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    pub async fn send(
        &self,
        node_id: &str,
        amount: &str,
        message: Option<&str>,
    ) -> Result<FlowReceipt, FlowError> {
        let (node_id, amount) = validate_keysend(node_id, amount)?;
        self.ctx.require_connected()?;
        let _guard = self.in_flight.try_begin().ok_or(FlowError::Busy)?;

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        let mut args = KeysendArgs::new(node_id.clone(), amount);
        if let Some(message) = message {
            args = args.with_record(KEYSEND_MESSAGE_RECORD, message);
        }
        let short_id = format_pubkey(&node_id, PUBKEY_DISPLAY_CHARS);

        match self.ctx.wallet.keysend(args).await {
            Ok(resp) => {
                let description = message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Keysend to {short_id}"));
                let tx = self.ctx.ledger.add(
                    NewTransaction::success(TransactionType::Keysend, amount, description)
                        .with_preimage(resp.preimage)
                        .with_destination(node_id),
                );
                Ok(FlowReceipt {
                    transaction: tx,
                    notification: Notification::success(
                        "Payment Sent",
                        format!("Successfully sent {amount} sats via Keysend"),
                    ),
                })
            }
            Err(e) => {
                tracing::warn!(destination = %node_id, error = %e, "keysend failed");
                let description = message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Failed keysend to {short_id}"));
                let tx = self.ctx.ledger.add(
                    NewTransaction::failed(
                        TransactionType::Keysend,
                        amount,
                        description,
                        e.to_string(),
                    )
                    .with_destination(node_id),
                );
                Err(FlowError::rejected("Payment Failed", e.to_string(), tx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connected_context, slow_context};
    use lnpay_core::models::TransactionStatus;
    use lnpay_core::validation::ValidationError;

    const NODE: &str = "03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f";

    #[tokio::test]
    async fn message_travels_as_custom_record() {
        let (ctx, wallet) = connected_context().await;
        let flow = KeysendFlow::new(ctx);

        let receipt = flow.send(NODE, "100", Some("thanks!")).await.unwrap();
        assert_eq!(receipt.transaction.description, "thanks!");
        assert_eq!(receipt.transaction.destination.as_deref(), Some(NODE));
        assert_eq!(
            receipt.notification.description,
            "Successfully sent 100 sats via Keysend"
        );

        let sent = wallet.keysends();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 100);
        assert_eq!(
            sent[0].custom_records.get(KEYSEND_MESSAGE_RECORD).map(String::as_str),
            Some("thanks!")
        );
    }

    #[tokio::test]
    async fn default_description_uses_short_pubkey() {
        let (ctx, wallet) = connected_context().await;
        let flow = KeysendFlow::new(ctx);

        let receipt = flow.send(NODE, "5", Some("   ")).await.unwrap();
        assert_eq!(
            receipt.transaction.description,
            "Keysend to 03864ef025fd...c366597a3f8f"
        );
        assert!(wallet.keysends()[0].custom_records.is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_destination() {
        let (ctx, wallet) = connected_context().await;
        wallet.fail_with("keysend not supported");
        let flow = KeysendFlow::new(ctx.clone());

        let err = flow.send(NODE, "5", None).await.unwrap_err();
        let tx = err.transaction().unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.destination.as_deref(), Some(NODE));
        assert!(tx.description.starts_with("Failed keysend to "));
    }

    #[tokio::test]
    async fn bad_pubkey_is_rejected_up_front() {
        let (ctx, wallet) = connected_context().await;
        let flow = KeysendFlow::new(ctx.clone());

        let err = flow.send("02abcdef", "5", None).await.unwrap_err();
        assert!(matches!(err, FlowError::Invalid(ValidationError::InvalidNodeId)));
        let err = flow.send(NODE, "0", None).await.unwrap_err();
        assert!(matches!(err, FlowError::Invalid(ValidationError::InvalidAmount)));
        assert_eq!(wallet.calls(), 0);
        assert!(ctx.ledger.is_empty());
    }

    #[tokio::test]
    async fn overlapping_keysend_is_busy() {
        let (ctx, wallet) = slow_context().await;
        let flow = KeysendFlow::new(ctx.clone());

        let (a, b) = tokio::join!(flow.send(NODE, "10", None), flow.send(NODE, "20", None));
        assert!(a.is_ok());
        assert!(matches!(b, Err(FlowError::Busy)));
        assert_eq!(wallet.calls(), 1);
        assert_eq!(wallet.keysends().len(), 1);
        assert_eq!(ctx.ledger.len(), 1);
    }
}
