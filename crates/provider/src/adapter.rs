use super::{
    GetInfoResponse, KeysendArgs, MakeInvoiceResponse, RequestInvoiceArgs, SendPaymentResponse,
    WalletProvider,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No wallet was injected. Stays this way for the adapter's lifetime.
    Unavailable,
    Idle,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("WebLN is not available. Please install a compatible wallet (like Alby).")]
    Unavailable,
    #[error("Please connect your Lightning wallet first")]
    NotConnected,
    #[error("A wallet connection attempt is already in progress")]
    Connecting,
    #[error("Failed to connect to WebLN provider: {0}")]
    Connect(String),
    #[error("Failed to fetch node info: {0}")]
    NodeInfo(String),
}

/// Point-in-time view of the adapter, suitable for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub state: ConnectionState,
    pub provider: Option<String>,
    pub error: Option<String>,
    pub node_info: Option<GetInfoResponse>,
}

struct AdapterInner {
    state: ConnectionState,
    error: Option<String>,
    node_info: Option<GetInfoResponse>,
}

/// Tracks connection state around an injected [`WalletProvider`] and
/// forwards payment calls to it unchanged.
pub struct WalletAdapter {
    provider: Option<Arc<dyn WalletProvider>>,
    inner: Mutex<AdapterInner>,
}

impl WalletAdapter {
    /// Builds the adapter from whatever wallet the environment supplied.
    ///
    /// A wallet that reports itself as already enabled is treated as
    /// connected straight away and its node info is fetched.
    pub async fn probe(provider: Option<Arc<dyn WalletProvider>>) -> Arc<Self> {
        let (state, error) = match &provider {
            None => (
                ConnectionState::Unavailable,
                Some(AdapterError::Unavailable.to_string()),
            ),
            Some(_) => (ConnectionState::Idle, None),
        };
        let adapter = Arc::new(Self {
            provider,
            inner: Mutex::new(AdapterInner {
                state,
                error,
                node_info: None,
            }),
        });

        if let Some(provider) = adapter.provider.as_ref() {
            if provider.is_enabled().await {
                tracing::info!(provider = %provider.name(), "wallet already enabled");
                adapter.lock().state = ConnectionState::Connected;
                let _ = adapter.refresh_info().await;
            }
        }
        adapter
    }

    fn lock(&self) -> MutexGuard<'_, AdapterInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn status(&self) -> WalletStatus {
        let inner = self.lock();
        WalletStatus {
            state: inner.state,
            provider: self.provider.as_ref().map(|p| p.name().to_string()),
            error: inner.error.clone(),
            node_info: inner.node_info.clone(),
        }
    }

    pub async fn connect(&self) -> Result<(), AdapterError> {
        let provider = {
            let mut inner = self.lock();
            match inner.state {
                ConnectionState::Unavailable => return Err(AdapterError::Unavailable),
                ConnectionState::Connecting => return Err(AdapterError::Connecting),
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Idle => {}
            }
            let Some(provider) = self.provider.clone() else {
                return Err(AdapterError::Unavailable);
            };
            inner.state = ConnectionState::Connecting;
            inner.error = None;
            provider
        };

        if let Err(e) = provider.enable().await {
            let err = AdapterError::Connect(e.to_string());
            let mut inner = self.lock();
            inner.state = ConnectionState::Idle;
            inner.error = Some(err.to_string());
            tracing::warn!(provider = %provider.name(), error = %e, "wallet enable failed");
            return Err(err);
        }

        self.lock().state = ConnectionState::Connected;
        tracing::info!(provider = %provider.name(), "wallet connected");
        // failures are kept in the error field; the connection stands
        let _ = self.refresh_info().await;
        Ok(())
    }

    pub fn disconnect(&self) {
        let mut inner = self.lock();
        if inner.state == ConnectionState::Connected {
            inner.state = ConnectionState::Idle;
            inner.node_info = None;
            tracing::info!("wallet disconnected");
        }
    }

    /// Re-reads node info. Returns `Ok(None)` when not connected.
    pub async fn refresh_info(&self) -> Result<Option<GetInfoResponse>, AdapterError> {
        let provider = match (self.state(), self.provider.clone()) {
            (ConnectionState::Connected, Some(provider)) => provider,
            _ => return Ok(None),
        };

        match provider.get_info().await {
            Ok(info) => {
                let mut inner = self.lock();
                if inner.state == ConnectionState::Connected {
                    inner.node_info = Some(info.clone());
                }
                Ok(Some(info))
            }
            Err(e) => {
                let err = AdapterError::NodeInfo(e.to_string());
                self.lock().error = Some(err.to_string());
                tracing::warn!(error = %e, "node info refresh failed");
                Err(err)
            }
        }
    }

    /// Refreshes node info on a fixed period while connected. The task ends
    /// once the adapter is dropped.
    pub fn spawn_info_refresh(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                let Some(adapter) = weak.upgrade() else {
                    break;
                };
                if adapter.is_connected() {
                    let _ = adapter.refresh_info().await;
                }
            }
        })
    }

    fn connected_provider(&self) -> Result<Arc<dyn WalletProvider>, AdapterError> {
        match (self.state(), self.provider.clone()) {
            (ConnectionState::Unavailable, _) | (_, None) => Err(AdapterError::Unavailable),
            (ConnectionState::Connected, Some(provider)) => Ok(provider),
            _ => Err(AdapterError::NotConnected),
        }
    }

    pub async fn get_info(&self) -> anyhow::Result<GetInfoResponse> {
        self.connected_provider()?.get_info().await
    }

    pub async fn send_payment(&self, payment_request: &str) -> anyhow::Result<SendPaymentResponse> {
        self.connected_provider()?.send_payment(payment_request).await
    }

    pub async fn make_invoice(
        &self,
        args: RequestInvoiceArgs,
    ) -> anyhow::Result<MakeInvoiceResponse> {
        self.connected_provider()?.make_invoice(args).await
    }

    pub async fn keysend(&self, args: KeysendArgs) -> anyhow::Result<SendPaymentResponse> {
        self.connected_provider()?.keysend(args).await
    }
}
