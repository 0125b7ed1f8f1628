use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flows::{FlowError, Notification};
use lnpay_core::models::Transaction;
use provider::AdapterError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<Transaction>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Flow(FlowError::Invalid(_) | FlowError::OutOfBounds(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Flow(FlowError::Wallet(
                AdapterError::Unavailable | AdapterError::NotConnected | AdapterError::Connecting,
            )) => StatusCode::CONFLICT,
            Self::Flow(FlowError::Wallet(_) | FlowError::Rejected { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Flow(FlowError::Busy) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<AdapterError> for ApiError {
    fn from(e: AdapterError) -> Self {
        Self::Flow(FlowError::Wallet(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Flow(e) => ErrorBody {
                success: false,
                error: e.to_string(),
                notification: Some(e.notification()),
                transaction: e.transaction().cloned(),
            },
            Self::BadRequest(msg) => ErrorBody {
                success: false,
                error: msg.clone(),
                notification: None,
                transaction: None,
            },
        };
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %body.error, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
