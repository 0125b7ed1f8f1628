pub mod commands;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api = Router::new()
        .route("/healthcheck", get(routes::healthcheck))
        .route("/lightning/webhook", post(routes::lightning_webhook))
        .route("/lightning/get-invoice", get(routes::get_invoice))
        .route("/wallet", get(commands::wallet_status))
        .route("/wallet/connect", post(commands::wallet_connect))
        .route("/wallet/disconnect", post(commands::wallet_disconnect))
        .route("/wallet/refresh", post(commands::wallet_refresh))
        .route("/payments/invoice", post(commands::pay_invoice))
        .route("/payments/keysend", post(commands::keysend))
        .route("/payments/make-invoice", post(commands::make_invoice))
        .route("/payments/lightning-address", post(commands::pay_lightning_address))
        .route("/scroll", get(commands::scroll_status))
        .route("/scroll/toggle", post(commands::scroll_toggle))
        .route("/scroll/test-mode", post(commands::scroll_test_mode))
        .route("/scroll/reset", post(commands::scroll_reset))
        .route("/scroll/event", post(commands::scroll_event))
        .route(
            "/transactions",
            get(commands::list_transactions).delete(commands::clear_transactions),
        )
        .route(
            "/currency",
            get(commands::get_currency).put(commands::set_currency),
        )
        .route("/currency/convert", get(commands::convert));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .with_state(state)
}
