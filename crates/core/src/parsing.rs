const LIGHTNING_SCHEME: &str = "lightning:";
const MSAT_PER_SAT: u64 = 1_000;
const MSAT_PER_BTC: u64 = 100_000_000_000;

/// BOLT11 network prefixes, longest first so `bcrt` wins over `bc`.
const NETWORK_PREFIXES: [&str; 5] = ["bcrt", "tbs", "bc", "tb", "sb"];

pub fn strip_lightning_scheme(invoice: &str) -> &str {
    match invoice.get(..LIGHTNING_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(LIGHTNING_SCHEME) => {
            &invoice[LIGHTNING_SCHEME.len()..]
        }
        _ => invoice,
    }
}

pub fn lightning_uri(payment_request: &str) -> String {
    format!("{LIGHTNING_SCHEME}{payment_request}")
}

/// Reads the amount encoded in a BOLT11 human readable part, in whole sats.
///
/// Returns `None` for amountless invoices or anything that does not look
/// like an invoice. No signature or checksum verification happens here.
pub fn invoice_amount_sats(invoice: &str) -> Option<u64> {
    let invoice = strip_lightning_scheme(invoice.trim()).to_ascii_lowercase();
    let hrp = &invoice[..invoice.rfind('1')?];
    let rest = hrp.strip_prefix("ln")?;
    let amount = NETWORK_PREFIXES
        .iter()
        .find_map(|network| rest.strip_prefix(network))?;
    if amount.is_empty() {
        return None;
    }

    let (digits, multiplier) = match amount.as_bytes()[amount.len() - 1] {
        b'm' => (&amount[..amount.len() - 1], Some(b'm')),
        b'u' => (&amount[..amount.len() - 1], Some(b'u')),
        b'n' => (&amount[..amount.len() - 1], Some(b'n')),
        b'p' => (&amount[..amount.len() - 1], Some(b'p')),
        _ => (amount, None),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;

    let msat = match multiplier {
        None => value.checked_mul(MSAT_PER_BTC)?,
        Some(b'm') => value.checked_mul(MSAT_PER_BTC / 1_000)?,
        Some(b'u') => value.checked_mul(MSAT_PER_BTC / 1_000_000)?,
        Some(b'n') => value.checked_mul(MSAT_PER_BTC / 1_000_000_000)?,
        // pico-bitcoin is a tenth of a millisatoshi
        Some(_) => value / 10,
    };
    Some(msat_to_sat(msat))
}

pub fn msat_to_sat(msat: u64) -> u64 {
    msat / MSAT_PER_SAT
}

pub fn sat_to_msat(sats: u64) -> Option<u64> {
    sats.checked_mul(MSAT_PER_SAT)
}

/// Shortens a pubkey to `head...tail` for display.
pub fn format_pubkey(pubkey: &str, length: usize) -> String {
    if pubkey.len() < length * 2 || !pubkey.is_ascii() {
        return pubkey.to_string();
    }
    let start = &pubkey[..length];
    let end = &pubkey[pubkey.len() - length..];
    format!("{start}...{end}")
}
