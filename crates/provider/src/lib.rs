use anyhow::Result;
use async_trait::async_trait;

pub mod adapter;
pub mod lnurl;
pub mod mock;
pub mod types;

pub use adapter::{AdapterError, ConnectionState, WalletAdapter, WalletStatus};
pub use types::{
    GetInfoResponse, KeysendArgs, MakeInvoiceResponse, RequestInvoiceArgs, SendPaymentResponse,
};

/// Custom TLV record type used for keysend messages.
pub const KEYSEND_MESSAGE_RECORD: &str = "696969";

/// A WebLN-style wallet: the payment capability handed to the adapter.
///
/// Implementations are opaque to this workspace; every method is a plain
/// call with no retries or timeouts layered on top.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the wallet already granted access before `enable` is called.
    async fn is_enabled(&self) -> bool {
        false
    }

    async fn enable(&self) -> Result<()>;
    async fn get_info(&self) -> Result<GetInfoResponse>;
    async fn send_payment(&self, payment_request: &str) -> Result<SendPaymentResponse>;
    async fn make_invoice(&self, args: RequestInvoiceArgs) -> Result<MakeInvoiceResponse>;
    async fn keysend(&self, args: KeysendArgs) -> Result<SendPaymentResponse>;
}
