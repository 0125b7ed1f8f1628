use super::ValidationError;

/// A node pubkey is a compressed secp256k1 point: 66 hex characters
/// starting with `0`.
pub fn is_valid_node_id(pubkey: &str) -> bool {
    pubkey.len() == 66 && pubkey.starts_with('0') && hex::decode(pubkey).is_ok()
}

/// Accepts `user@domain.tld` shaped strings: exactly one `@`, no whitespace,
/// and a dot inside the domain with text on both sides.
pub fn is_valid_lightning_address(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((user, domain)) = address.split_once('@') else {
        return false;
    };
    if user.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Amounts are whole satoshis strictly greater than zero.
pub fn parse_amount(input: &str) -> Result<u64, ValidationError> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAmount);
    }
    match input.parse::<u64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(ValidationError::InvalidAmount),
    }
}
