use anyhow::Context;
use app::AppState;
use ledger::{SledStore, TransactionLedger};
use provider::mock::MockWallet;
use provider::{WalletAdapter, WalletProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NODE_INFO_REFRESH: Duration = Duration::from_secs(60);

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn create_wallet_provider(cfg: &config::ProviderConfig) -> Option<Arc<dyn WalletProvider>> {
    match cfg.kind.as_str() {
        "none" => {
            tracing::info!("No wallet provider configured");
            None
        }
        _ => {
            tracing::info!(latency_ms = cfg.latency_ms, "Using mock wallet");
            Some(MockWallet::with_options(
                Duration::from_millis(cfg.latency_ms),
                cfg.auto_enable,
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default config");
        config::AppConfig::default()
    });

    let wallet = WalletAdapter::probe(create_wallet_provider(&cfg.provider)).await;
    let _refresh = wallet.spawn_info_refresh(NODE_INFO_REFRESH);

    let store = SledStore::open(&cfg.ledger.path)
        .with_context(|| format!("Failed to open ledger at {}", cfg.ledger.path))?;
    let ledger = Arc::new(TransactionLedger::open(Arc::new(store)));

    let state = Arc::new(AppState::from_config(&cfg, wallet, ledger));
    let app = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.bind))?;
    tracing::info!(addr = %cfg.server.bind, "serving");

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
