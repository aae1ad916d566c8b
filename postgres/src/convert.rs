//! Conversions between domain values and their column representations.
//!
//! Addresses and token ids are stored as text (hex for addresses, decimal
//! for token ids) so the schema stays portable across managed Postgres
//! offerings without custom numeric domains.

use primitive_types::{H160, U256};
use std::str::FromStr;
use ticketmint_core::CoreError;

pub(crate) fn address_to_text(address: H160) -> String {
    format!("{address:#x}")
}

pub(crate) fn address_from_text(text: &str) -> Result<H160, CoreError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    H160::from_str(digits)
        .map_err(|e| CoreError::Persistence(format!("invalid address column {text}: {e}")))
}

pub(crate) fn token_id_to_text(token_id: U256) -> String {
    token_id.to_string()
}

pub(crate) fn token_id_from_text(text: &str) -> Result<U256, CoreError> {
    U256::from_dec_str(text)
        .map_err(|e| CoreError::Persistence(format!("invalid token id column {text}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn address_roundtrip() {
        let addr = H160::repeat_byte(0xab);
        let text = address_to_text(addr);
        assert!(text.starts_with("0x"));
        assert_eq!(address_from_text(&text).unwrap(), addr);
    }

    #[test]
    fn token_id_roundtrip() {
        let id = U256::from(123_456u64);
        assert_eq!(token_id_to_text(id), "123456");
        assert_eq!(token_id_from_text("123456").unwrap(), id);
        assert!(token_id_from_text("not-a-number").is_err());
    }
}
