use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Payment,
    Keysend,
    Invoice,
    LightningAddress,
    PayPerScroll,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Keysend => "keysend",
            Self::Invoice => "invoice",
            Self::LightningAddress => "lightning-address",
            Self::PayPerScroll => "pay-per-scroll",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "keysend" => Ok(Self::Keysend),
            "invoice" => Ok(Self::Invoice),
            "lightning-address" => Ok(Self::LightningAddress),
            "pay-per-scroll" => Ok(Self::PayPerScroll),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

/// One attempted payment operation as stored in the ledger.
///
/// Field names serialize in camelCase; `kind` is stored as `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: u64,
    pub description: String,
    /// Milliseconds since the unix epoch.
    pub timestamp: i64,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A transaction before the ledger has assigned its `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: u64,
    pub description: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub preimage: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub payment_request: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionType,
        amount: u64,
        description: impl Into<String>,
        status: TransactionStatus,
    ) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            status,
            preimage: None,
            destination: None,
            payment_request: None,
            error: None,
        }
    }

    pub fn success(kind: TransactionType, amount: u64, description: impl Into<String>) -> Self {
        Self::new(kind, amount, description, TransactionStatus::Success)
    }

    pub fn failed(
        kind: TransactionType,
        amount: u64,
        description: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(kind, amount, description, TransactionStatus::Failed).with_error(error)
    }

    pub fn with_preimage(mut self, preimage: impl Into<String>) -> Self {
        self.preimage = Some(preimage.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_payment_request(mut self, payment_request: impl Into<String>) -> Self {
        self.payment_request = Some(payment_request.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn into_transaction(self, id: String, timestamp: i64) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            timestamp,
            status: self.status,
            preimage: self.preimage,
            destination: self.destination,
            payment_request: self.payment_request,
            error: self.error,
        }
    }
}

/// One section unlocked by the pay-per-scroll demo. In-memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPayment {
    /// 1-based section index.
    pub section: u32,
    pub amount: u64,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_serializes_with_camel_case_fields() {
        let tx = NewTransaction::success(TransactionType::LightningAddress, 21, "Payment to a@b.c")
            .with_payment_request("lnbc210n1xyz")
            .into_transaction("abc".to_string(), 1_700_000_000_000);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "lightning-address");
        assert_eq!(json["status"], "success");
        assert_eq!(json["paymentRequest"], "lnbc210n1xyz");
        assert!(json.get("preimage").is_none());

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn transaction_type_parses_wire_names() {
        assert_eq!(
            "pay-per-scroll".parse::<TransactionType>().unwrap(),
            TransactionType::PayPerScroll
        );
        assert!("refund".parse::<TransactionType>().is_err());
    }
}
