//! # Core Primitive Entities
//!
//! Identity, commitment and amount types shared by the ledger, the proof
//! pipeline and the signature layer.

use crate::errors::HexError;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte hash (keccak-256 output or a committed state root).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style account address.
pub type Address = [u8; 20];

/// Token identifiers are the address of the token contract.
pub type TokenId = Address;

/// Token amount in base units.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The all-zero address; never a valid participant, token or signer.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// The all-zero hash; used as "no root committed yet".
pub const ZERO_HASH: Hash = [0u8; 32];

/// Build an address whose every byte is `byte`. Handy for fixtures.
pub const fn address_from_byte(byte: u8) -> Address {
    [byte; 20]
}

/// Lowercase `0x`-prefixed hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Abbreviated hex (`0xabcd..ef01`) for log lines.
pub fn short_hex(bytes: &[u8]) -> String {
    if bytes.len() <= 4 {
        return to_hex(bytes);
    }
    format!(
        "0x{}..{}",
        hex::encode(&bytes[..2]),
        hex::encode(&bytes[bytes.len() - 2..])
    )
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], HexError> {
    let trimmed = input.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(stripped).map_err(|e| HexError::Invalid(e.to_string()))?;
    if bytes.len() != N {
        return Err(HexError::WrongLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a 20-byte address from hex, with or without `0x`.
pub fn parse_address(input: &str) -> Result<Address, HexError> {
    decode_fixed::<20>(input)
}

/// Parse a 32-byte hash from hex, with or without `0x`.
pub fn parse_hash(input: &str) -> Result<Hash, HexError> {
    decode_fixed::<32>(input)
}

/// Big-endian 32-byte encoding of a `U256`.
pub fn u256_to_hash(value: U256) -> Hash {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

/// Interpret a 32-byte big-endian word as a `U256`.
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_big_endian(hash)
}
