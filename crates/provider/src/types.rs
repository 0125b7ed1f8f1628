use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInvoiceArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_memo: Option<String>,
}

impl RequestInvoiceArgs {
    pub fn fixed(amount: u64, memo: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            default_memo: Some(memo.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysendArgs {
    pub destination: String,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_records: BTreeMap<String, String>,
}

impl KeysendArgs {
    pub fn new(destination: impl Into<String>, amount: u64) -> Self {
        Self {
            destination: destination.into(),
            amount,
            custom_records: BTreeMap::new(),
        }
    }

    pub fn with_record(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_records.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPaymentResponse {
    pub preimage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeInvoiceResponse {
    pub payment_request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRoute {
    pub pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Node metadata reported by the wallet. Every field is optional because
/// wallets disclose as much or as little as they like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInfoResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<NodeRoute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_peers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_to_chain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_uri: Option<String>,
}
