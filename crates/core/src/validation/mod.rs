mod rules;

pub use rules::{is_valid_lightning_address, is_valid_node_id, parse_amount};

use crate::parsing::strip_lightning_scheme;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a Lightning invoice")]
    MissingInvoice,
    #[error("Please enter a Lightning node pubkey")]
    MissingNodeId,
    #[error("Please enter a valid 66-character Lightning node pubkey")]
    InvalidNodeId,
    #[error("Please enter a Lightning address")]
    MissingAddress,
    #[error("Please enter a valid Lightning address (user@domain.com)")]
    InvalidAddress,
    #[error("Please enter a valid amount greater than 0")]
    InvalidAmount,
}

impl ValidationError {
    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingInvoice => "Missing Invoice",
            Self::MissingNodeId => "Missing Node ID",
            Self::InvalidNodeId => "Invalid Node ID",
            Self::MissingAddress => "Missing Lightning Address",
            Self::InvalidAddress => "Invalid Lightning Address",
            Self::InvalidAmount => "Invalid Amount",
        }
    }
}

/// Returns the payable invoice text with any `lightning:` scheme removed.
pub fn validate_invoice(invoice: &str) -> Result<String, ValidationError> {
    let cleaned = strip_lightning_scheme(invoice.trim());
    if cleaned.is_empty() {
        return Err(ValidationError::MissingInvoice);
    }
    Ok(cleaned.to_string())
}

pub fn validate_keysend(node_id: &str, amount: &str) -> Result<(String, u64), ValidationError> {
    let node_id = node_id.trim();
    if node_id.is_empty() {
        return Err(ValidationError::MissingNodeId);
    }
    if !is_valid_node_id(node_id) {
        return Err(ValidationError::InvalidNodeId);
    }
    let amount = parse_amount(amount)?;
    Ok((node_id.to_string(), amount))
}

pub fn validate_lightning_address(
    address: &str,
    amount: &str,
) -> Result<(String, u64), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    if !is_valid_lightning_address(address) {
        return Err(ValidationError::InvalidAddress);
    }
    let amount = parse_amount(amount)?;
    Ok((address.to_string(), amount))
}
