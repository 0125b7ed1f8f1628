//! Lightning Address resolution over the LNURL-pay well-known convention.

use lnpay_core::parsing::sat_to_msat;
use lnpay_core::validation::is_valid_lightning_address;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const PAY_REQUEST_TAG: &str = "payRequest";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LnurlError {
    #[error("Invalid lightning address format")]
    InvalidAddress,
    #[error("Failed to resolve Lightning Address: {0}")]
    Resolve(String),
    #[error("Lightning Address does not support payments")]
    NotPayRequest,
    #[error("Amount too small. Minimum is {min_sats} sats")]
    AmountTooSmall { min_sats: u64 },
    #[error("Amount too large. Maximum is {max_sats} sats")]
    AmountTooLarge { max_sats: u64 },
    #[error("Failed to get invoice: {0}")]
    Invoice(String),
    #[error("No payment request returned")]
    MissingInvoice,
    #[error("Lightning service error: {0}")]
    Service(String),
}

impl LnurlError {
    /// Bound violations are caught before any invoice is fetched.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(
            self,
            Self::AmountTooSmall { .. } | Self::AmountTooLarge { .. }
        )
    }
}

/// The `payRequest` document served at `/.well-known/lnurlp/<user>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub tag: String,
    pub callback: String,
    /// Millisatoshis.
    pub min_sendable: u64,
    /// Millisatoshis.
    pub max_sendable: u64,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub comment_allowed: Option<usize>,
}

impl PayRequest {
    /// Checks `amount_sats` against the advertised bounds and returns the
    /// amount in millisatoshis.
    pub fn check_amount(&self, amount_sats: u64) -> Result<u64, LnurlError> {
        let msat = sat_to_msat(amount_sats).ok_or(LnurlError::AmountTooLarge {
            max_sats: self.max_sendable / 1_000,
        })?;
        if msat < self.min_sendable {
            return Err(LnurlError::AmountTooSmall {
                min_sats: self.min_sendable.div_ceil(1_000),
            });
        }
        if msat > self.max_sendable {
            return Err(LnurlError::AmountTooLarge {
                max_sats: self.max_sendable / 1_000,
            });
        }
        Ok(msat)
    }
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    #[serde(default)]
    pr: Option<String>,
}

#[derive(Clone)]
pub struct LnurlClient {
    http_client: reqwest::Client,
    scheme: String,
}

impl Default for LnurlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LnurlClient {
    pub fn new() -> Self {
        Self::with_scheme("https")
    }

    /// `http` is only useful against local test services.
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            scheme: scheme.into(),
        }
    }

    pub fn discovery_url(&self, address: &str) -> Result<String, LnurlError> {
        if !is_valid_lightning_address(address) {
            return Err(LnurlError::InvalidAddress);
        }
        let (user, domain) = address
            .split_once('@')
            .ok_or(LnurlError::InvalidAddress)?;
        Ok(format!(
            "{}://{}/.well-known/lnurlp/{}",
            self.scheme, domain, user
        ))
    }

    pub async fn resolve(&self, address: &str) -> Result<PayRequest, LnurlError> {
        let url = self.discovery_url(address)?;
        tracing::debug!(%url, "resolving lightning address");

        let body = self
            .get_json(&url)
            .await
            .map_err(LnurlError::Resolve)?;
        check_service_error(&body)?;

        let pay: PayRequest = serde_json::from_value(body)
            .map_err(|e| LnurlError::Resolve(format!("invalid payRequest: {e}")))?;
        if pay.tag != PAY_REQUEST_TAG {
            return Err(LnurlError::NotPayRequest);
        }
        Ok(pay)
    }

    /// Asks the pay callback for an invoice. Bounds are checked first so an
    /// out-of-range amount never reaches the service.
    pub async fn fetch_invoice(
        &self,
        address: &str,
        pay: &PayRequest,
        amount_sats: u64,
    ) -> Result<String, LnurlError> {
        let msat = pay.check_amount(amount_sats)?;

        let mut callback = Url::parse(&pay.callback)
            .map_err(|e| LnurlError::Invoice(format!("invalid callback url: {e}")))?;
        {
            let mut query = callback.query_pairs_mut();
            query.append_pair("amount", &msat.to_string());
            if let Some(allowed) = pay.comment_allowed.filter(|n| *n > 0) {
                let comment: String = format!("Payment to {address}")
                    .chars()
                    .take(allowed)
                    .collect();
                query.append_pair("comment", &comment);
            }
        }

        let body = self
            .get_json(callback.as_str())
            .await
            .map_err(LnurlError::Invoice)?;
        check_service_error(&body)?;

        let invoice: InvoiceResponse = serde_json::from_value(body)
            .map_err(|e| LnurlError::Invoice(format!("invalid invoice response: {e}")))?;
        match invoice.pr {
            Some(pr) if !pr.trim().is_empty() => Ok(pr),
            _ => Err(LnurlError::MissingInvoice),
        }
    }

    /// Resolve then fetch: the full two-step address payment preparation.
    pub async fn request_invoice(
        &self,
        address: &str,
        amount_sats: u64,
    ) -> Result<String, LnurlError> {
        let pay = self.resolve(address).await?;
        self.fetch_invoice(address, &pay, amount_sats).await
    }

    async fn get_json(&self, url: &str) -> Result<Value, String> {
        let resp = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(resp.status().to_string());
        }
        resp.json::<Value>()
            .await
            .map_err(|e| format!("invalid JSON response: {e}"))
    }
}

/// LUD-06 services report failures as `{"status":"ERROR","reason":...}`.
fn check_service_error(body: &Value) -> Result<(), LnurlError> {
    let is_error = body
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("ERROR"));
    if is_error {
        let reason = body
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(LnurlError::Service(reason.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Service {
        addr: SocketAddr,
        min_sendable: u64,
        max_sendable: u64,
        comment_allowed: usize,
        invoice_hits: Arc<AtomicUsize>,
        last_query: Arc<Mutex<HashMap<String, String>>>,
    }

    async fn well_known(
        State(svc): State<Service>,
        Path(user): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        match user.as_str() {
            "alice" => Ok(Json(json!({
                "tag": "payRequest",
                "callback": format!("http://{}/callback?user=alice", svc.addr),
                "minSendable": svc.min_sendable,
                "maxSendable": svc.max_sendable,
                "metadata": "[[\"text/plain\",\"alice\"]]",
                "commentAllowed": svc.comment_allowed,
            }))),
            "withdraw" => Ok(Json(json!({
                "tag": "withdrawRequest",
                "callback": "http://unused",
                "minSendable": 1,
                "maxSendable": 1,
            }))),
            "broken" => Ok(Json(json!({"status": "ERROR", "reason": "user suspended"}))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn callback(
        State(svc): State<Service>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        svc.invoice_hits.fetch_add(1, Ordering::SeqCst);
        let msat: u64 = params.get("amount").and_then(|a| a.parse().ok()).unwrap_or(0);
        *svc.last_query.lock().unwrap() = params;
        Json(json!({ "pr": format!("lnbc{}n1mockinvoice", msat / 100), "routes": [] }))
    }

    async fn spawn_service(min_sendable: u64, max_sendable: u64, comment_allowed: usize) -> Service {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let svc = Service {
            addr: listener.local_addr().unwrap(),
            min_sendable,
            max_sendable,
            comment_allowed,
            invoice_hits: Arc::new(AtomicUsize::new(0)),
            last_query: Arc::new(Mutex::new(HashMap::new())),
        };
        let app = Router::new()
            .route("/.well-known/lnurlp/{user}", get(well_known))
            .route("/callback", get(callback))
            .with_state(svc.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        svc
    }

    fn client() -> LnurlClient {
        LnurlClient::with_scheme("http")
    }

    #[test]
    fn discovery_url_follows_well_known_convention() {
        let url = LnurlClient::new().discovery_url("bob@walletofsatoshi.com").unwrap();
        assert_eq!(url, "https://walletofsatoshi.com/.well-known/lnurlp/bob");
        assert_eq!(
            LnurlClient::new().discovery_url("bob"),
            Err(LnurlError::InvalidAddress)
        );
    }

    #[test]
    fn bounds_compare_millisats() {
        let pay = PayRequest {
            tag: PAY_REQUEST_TAG.to_string(),
            callback: "https://example.com/cb".to_string(),
            min_sendable: 5_000,
            max_sendable: 1_000_000,
            metadata: None,
            comment_allowed: None,
        };
        assert_eq!(pay.check_amount(3), Err(LnurlError::AmountTooSmall { min_sats: 5 }));
        assert_eq!(pay.check_amount(5), Ok(5_000));
        assert_eq!(pay.check_amount(1_000), Ok(1_000_000));
        assert_eq!(
            pay.check_amount(1_001),
            Err(LnurlError::AmountTooLarge { max_sats: 1_000 })
        );
        assert!(pay.check_amount(3).unwrap_err().is_out_of_bounds());
    }

    #[tokio::test]
    async fn resolves_and_fetches_invoice() {
        let svc = spawn_service(1_000, 100_000_000, 0).await;
        let address = format!("alice@{}", svc.addr);

        let pr = client().request_invoice(&address, 21).await.unwrap();
        assert_eq!(pr, "lnbc210n1mockinvoice");
        assert_eq!(svc.invoice_hits.load(Ordering::SeqCst), 1);

        let query = svc.last_query.lock().unwrap().clone();
        assert_eq!(query.get("amount").map(String::as_str), Some("21000"));
        assert_eq!(query.get("user").map(String::as_str), Some("alice"));
        assert!(!query.contains_key("comment"));
    }

    #[tokio::test]
    async fn comment_is_sent_when_allowed() {
        let svc = spawn_service(1_000, 100_000_000, 10).await;
        let address = format!("alice@{}", svc.addr);

        client().request_invoice(&address, 5).await.unwrap();
        let query = svc.last_query.lock().unwrap().clone();
        assert_eq!(query.get("comment").map(String::as_str), Some("Payment to"));
    }

    #[tokio::test]
    async fn amount_below_minimum_never_fetches_invoice() {
        let svc = spawn_service(5_000, 100_000_000, 0).await;
        let address = format!("alice@{}", svc.addr);

        let err = client().request_invoice(&address, 3).await.unwrap_err();
        assert_eq!(err, LnurlError::AmountTooSmall { min_sats: 5 });
        assert_eq!(err.to_string(), "Amount too small. Minimum is 5 sats");
        assert_eq!(svc.invoice_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_user_reports_http_status() {
        let svc = spawn_service(1_000, 100_000_000, 0).await;
        let err = client()
            .resolve(&format!("nobody@{}", svc.addr))
            .await
            .unwrap_err();
        assert_eq!(err, LnurlError::Resolve("404 Not Found".to_string()));
    }

    #[tokio::test]
    async fn non_pay_and_error_documents_are_rejected() {
        let svc = spawn_service(1_000, 100_000_000, 0).await;
        let err = client()
            .resolve(&format!("withdraw@{}", svc.addr))
            .await
            .unwrap_err();
        assert_eq!(err, LnurlError::NotPayRequest);

        let err = client()
            .resolve(&format!("broken@{}", svc.addr))
            .await
            .unwrap_err();
        assert_eq!(err, LnurlError::Service("user suspended".to_string()));
    }
}
