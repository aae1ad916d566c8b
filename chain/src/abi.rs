//! Minimal ABI encoding for the ticket NFT contract calls.
//!
//! Covers exactly the types the contract surface needs: `address`,
//! `uint256`, `string`, `uint256[]`, and `string[]`, encoded per the
//! Solidity ABI head/tail layout. Function selectors are the first four
//! bytes of the keccak-256 hash of the canonical signature.

use primitive_types::{H160, U256};
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// A value encodable as a call argument.
#[derive(Clone, Debug)]
pub enum AbiToken {
    /// 20-byte address, left-padded to a word.
    Address(H160),
    /// Unsigned 256-bit integer.
    Uint(U256),
    /// Dynamic UTF-8 string.
    Str(String),
    /// Dynamic array of `uint256`.
    UintArray(Vec<U256>),
    /// Dynamic array of `string`.
    StrArray(Vec<String>),
}

impl AbiToken {
    const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Str(_) | Self::UintArray(_) | Self::StrArray(_))
    }
}

/// First four bytes of `keccak256(signature)`.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a function call: selector followed by the encoded arguments.
#[must_use]
pub fn encode_call(signature: &str, args: &[AbiToken]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode_tokens(args));
    out
}

/// Encode an argument tuple using the head/tail layout.
#[must_use]
pub fn encode_tokens(tokens: &[AbiToken]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut heads = Vec::with_capacity(head_len);
    let mut tails: Vec<u8> = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            heads.extend_from_slice(&uint_word(U256::from(head_len + tails.len())));
            tails.extend_from_slice(&encode_tail(token));
        } else {
            heads.extend_from_slice(&encode_static(token));
        }
    }

    heads.extend_from_slice(&tails);
    heads
}

fn encode_static(token: &AbiToken) -> [u8; WORD] {
    match token {
        AbiToken::Address(addr) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(addr.as_bytes());
            word
        }
        AbiToken::Uint(value) => uint_word(*value),
        // Dynamic tokens never reach here; is_dynamic gates the call.
        AbiToken::Str(_) | AbiToken::UintArray(_) | AbiToken::StrArray(_) => [0u8; WORD],
    }
}

fn encode_tail(token: &AbiToken) -> Vec<u8> {
    match token {
        AbiToken::Str(s) => encode_bytes(s.as_bytes()),
        AbiToken::UintArray(values) => {
            let mut out = uint_word(U256::from(values.len())).to_vec();
            for value in values {
                out.extend_from_slice(&uint_word(*value));
            }
            out
        }
        AbiToken::StrArray(values) => {
            // Element offsets are relative to the start of the element
            // head area, which begins after the length word.
            let mut out = uint_word(U256::from(values.len())).to_vec();
            let head_len = values.len() * WORD;
            let mut elem_tails: Vec<u8> = Vec::new();
            for value in values {
                out.extend_from_slice(&uint_word(U256::from(head_len + elem_tails.len())));
                elem_tails.extend_from_slice(&encode_bytes(value.as_bytes()));
            }
            out.extend_from_slice(&elem_tails);
            out
        }
        AbiToken::Address(_) | AbiToken::Uint(_) => Vec::new(),
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = uint_word(U256::from(bytes.len())).to_vec();
    out.extend_from_slice(bytes);
    let remainder = bytes.len() % WORD;
    if remainder != 0 {
        out.extend(std::iter::repeat(0u8).take(WORD - remainder));
    }
    out
}

fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}
