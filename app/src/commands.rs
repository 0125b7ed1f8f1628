use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use flows::{FlowReceipt, InvoiceReceipt, ScrollCharge, ScrollStatus, ScrollViewport};
use lnpay_core::currency::{self, Currency};
use lnpay_core::models::{Transaction, TransactionType};
use provider::{GetInfoResponse, WalletStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

type AppStateRef = State<Arc<AppState>>;

/// Successful responses carry `success: true` next to the payload fields.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

fn ok<T>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

/// Form fields arrive as typed text; numbers are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Number(serde_json::Number),
}

impl FormValue {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

// wallet

pub async fn wallet_status(State(state): AppStateRef) -> Json<WalletStatus> {
    Json(state.wallet.status())
}

pub async fn wallet_connect(State(state): AppStateRef) -> ApiResult<Json<WalletStatus>> {
    state.wallet.connect().await?;
    Ok(Json(state.wallet.status()))
}

pub async fn wallet_disconnect(State(state): AppStateRef) -> Json<WalletStatus> {
    state.wallet.disconnect();
    Json(state.wallet.status())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoResponse {
    node_info: Option<GetInfoResponse>,
}

pub async fn wallet_refresh(
    State(state): AppStateRef,
) -> ApiResult<Json<Success<NodeInfoResponse>>> {
    let node_info = state.wallet.refresh_info().await?;
    Ok(ok(NodeInfoResponse { node_info }))
}

// payments

#[derive(Debug, Deserialize)]
pub struct SendPaymentRequest {
    pub invoice: String,
}

pub async fn pay_invoice(
    State(state): AppStateRef,
    Json(req): Json<SendPaymentRequest>,
) -> ApiResult<Json<Success<FlowReceipt>>> {
    let receipt = state.send.pay(&req.invoice).await?;
    Ok(ok(receipt))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysendRequest {
    pub node_id: String,
    pub amount: FormValue,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn keysend(
    State(state): AppStateRef,
    Json(req): Json<KeysendRequest>,
) -> ApiResult<Json<Success<FlowReceipt>>> {
    let receipt = state
        .keysend
        .send(&req.node_id, &req.amount.as_text(), req.message.as_deref())
        .await?;
    Ok(ok(receipt))
}

#[derive(Debug, Deserialize)]
pub struct MakeInvoiceRequest {
    pub amount: FormValue,
    #[serde(default)]
    pub memo: Option<String>,
}

pub async fn make_invoice(
    State(state): AppStateRef,
    Json(req): Json<MakeInvoiceRequest>,
) -> ApiResult<Json<Success<InvoiceReceipt>>> {
    let receipt = state
        .invoice
        .create(&req.amount.as_text(), req.memo.as_deref())
        .await?;
    Ok(ok(receipt))
}

#[derive(Debug, Deserialize)]
pub struct LightningAddressRequest {
    pub address: String,
    pub amount: FormValue,
}

pub async fn pay_lightning_address(
    State(state): AppStateRef,
    Json(req): Json<LightningAddressRequest>,
) -> ApiResult<Json<Success<FlowReceipt>>> {
    let receipt = state
        .address
        .pay(&req.address, &req.amount.as_text())
        .await?;
    Ok(ok(receipt))
}

// scroll

pub async fn scroll_status(State(state): AppStateRef) -> Json<ScrollStatus> {
    Json(state.scroll.status())
}

pub async fn scroll_toggle(State(state): AppStateRef) -> ApiResult<Json<ScrollStatus>> {
    state.scroll.toggle().await?;
    Ok(Json(state.scroll.status()))
}

#[derive(Debug, Deserialize)]
pub struct TestModeRequest {
    pub enabled: bool,
}

pub async fn scroll_test_mode(
    State(state): AppStateRef,
    Json(req): Json<TestModeRequest>,
) -> Json<ScrollStatus> {
    state.scroll.set_test_mode(req.enabled);
    Json(state.scroll.status())
}

pub async fn scroll_reset(State(state): AppStateRef) -> Json<ScrollStatus> {
    state.scroll.reset();
    Json(state.scroll.status())
}

#[derive(Debug, Serialize)]
pub struct ScrollEventResponse {
    charge: Option<ScrollCharge>,
    status: ScrollStatus,
}

pub async fn scroll_event(
    State(state): AppStateRef,
    Json(viewport): Json<ScrollViewport>,
) -> ApiResult<Json<Success<ScrollEventResponse>>> {
    let charge = state.scroll.on_scroll(viewport).await?;
    Ok(ok(ScrollEventResponse {
        charge,
        status: state.scroll.status(),
    }))
}

// transactions

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

pub async fn list_transactions(
    State(state): AppStateRef,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<TransactionType>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let txs = match (kind, query.limit) {
        (Some(kind), Some(limit)) => state.ledger.recent_by_type(kind, limit),
        (Some(kind), None) => state.ledger.by_type(kind),
        (None, Some(limit)) => state.ledger.recent(limit),
        (None, None) => state.ledger.transactions(),
    };
    Ok(Json(txs))
}

pub async fn clear_transactions(State(state): AppStateRef) -> Json<Value> {
    state.ledger.clear();
    Json(json!({ "success": true }))
}

// currency

#[derive(Debug, Serialize)]
pub struct CurrencyInfo {
    code: &'static str,
    symbol: &'static str,
    rate: f64,
}

impl From<Currency> for CurrencyInfo {
    fn from(c: Currency) -> Self {
        Self {
            code: c.code(),
            symbol: c.symbol(),
            rate: c.rate(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrencyResponse {
    selected: CurrencyInfo,
    available: Vec<CurrencyInfo>,
}

fn currency_response(selected: Currency) -> Json<CurrencyResponse> {
    Json(CurrencyResponse {
        selected: selected.into(),
        available: Currency::ALL.into_iter().map(CurrencyInfo::from).collect(),
    })
}

pub async fn get_currency(State(state): AppStateRef) -> Json<CurrencyResponse> {
    currency_response(state.currency())
}

#[derive(Debug, Deserialize)]
pub struct SetCurrencyRequest {
    pub currency: String,
}

pub async fn set_currency(
    State(state): AppStateRef,
    Json(req): Json<SetCurrencyRequest>,
) -> ApiResult<Json<CurrencyResponse>> {
    let currency: Currency = req.currency.parse().map_err(ApiError::BadRequest)?;
    state.set_currency(currency);
    Ok(currency_response(currency))
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub sats: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    sats: u64,
    btc: f64,
    fiat: f64,
    currency: &'static str,
    formatted: String,
    formatted_sats: String,
}

pub async fn convert(
    State(state): AppStateRef,
    Query(query): Query<ConvertQuery>,
) -> Json<Conversion> {
    let selected = state.currency();
    Json(Conversion {
        sats: query.sats,
        btc: currency::sats_to_btc(query.sats),
        fiat: currency::sats_to_fiat(query.sats, selected),
        currency: selected.code(),
        formatted: currency::format_sats_to_fiat(query.sats, selected),
        formatted_sats: currency::format_sats(query.sats),
    })
}
