//! Minimal Solidity ABI support for the drug registry contract.
//!
//! Only the shapes the contract uses are covered: the
//! `registerDrug(string,string,string,uint256)` call and the non-indexed
//! payload of `DrugRegistered`, which share the same layout.

use sha3::{Digest, Keccak256};

pub const REGISTER_DRUG_SIGNATURE: &str = "registerDrug(string,string,string,uint256)";
pub const DRUG_REGISTERED_SIGNATURE: &str =
    "DrugRegistered(bytes32,string,string,string,uint256)";

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("ABI data truncated at byte {offset}")]
    Truncated { offset: usize },
    #[error("ABI offset or length does not fit in memory")]
    Overflow,
    #[error("ABI string is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid hex payload: {message}")]
    Hex { message: String },
}

/// Non-indexed fields of a `DrugRegistered` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugFields {
    pub name: String,
    pub batch: String,
    pub manufacturer: String,
    pub expiry: u64,
}

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    Keccak256::digest(bytes).into()
}

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let [a, b, c, d, ..] = keccak256(signature.as_bytes());
    [a, b, c, d]
}

/// Topic hash identifying an event, as a `0x`-prefixed hex string.
pub fn event_topic(signature: &str) -> String {
    to_hex(&keccak256(signature.as_bytes()))
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(raw: &str) -> Result<Vec<u8>, AbiError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    hex::decode(digits).map_err(|err| AbiError::Hex {
        message: err.to_string(),
    })
}

/// Right-align little-endian bytes into a big-endian word.
fn word_from_le(bytes: impl IntoIterator<Item = u8>) -> [u8; WORD] {
    let mut word = [0_u8; WORD];
    for (slot, byte) in word.iter_mut().rev().zip(bytes) {
        *slot = byte;
    }
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    word_from_le(value.to_le_bytes())
}

fn string_tail(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut tail = Vec::with_capacity(WORD + padded);
    tail.extend_from_slice(&usize_word(bytes.len()));
    tail.extend_from_slice(bytes);
    tail.resize(WORD + padded, 0);
    tail
}

/// Encode `(string,string,string,uint256)` without a selector.
pub fn encode_drug_fields(name: &str, batch: &str, manufacturer: &str, expiry: u64) -> Vec<u8> {
    let strings = [name, batch, manufacturer];
    let head_len = (strings.len() + 1) * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for value in strings {
        head.extend_from_slice(&usize_word(head_len + tail.len()));
        tail.extend(string_tail(value));
    }
    head.extend_from_slice(&word_from_le(expiry.to_le_bytes()));
    head.extend(tail);
    head
}

/// Calldata for `registerDrug(string,string,string,uint256)`.
pub fn register_drug_calldata(name: &str, batch: &str, manufacturer: &str, expiry: u64) -> Vec<u8> {
    let mut calldata = selector(REGISTER_DRUG_SIGNATURE).to_vec();
    calldata.extend(encode_drug_fields(name, batch, manufacturer, expiry));
    calldata
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    data.get(offset..end).ok_or(AbiError::Truncated { offset })
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, AbiError> {
    let word = word_at(data, offset)?;
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|byte| *byte != 0) {
        return Err(AbiError::Overflow);
    }
    let low: [u8; 8] = low.try_into().map_err(|_| AbiError::Truncated { offset })?;
    Ok(u64::from_be_bytes(low))
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    usize::try_from(read_u64(data, offset)?).map_err(|_| AbiError::Overflow)
}

fn read_string(data: &[u8], head_offset: usize) -> Result<String, AbiError> {
    let start = read_usize(data, head_offset)?;
    let len = read_usize(data, start)?;
    let begin = start.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let end = begin.checked_add(len).ok_or(AbiError::Overflow)?;
    let bytes = data
        .get(begin..end)
        .ok_or(AbiError::Truncated { offset: begin })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Decode the data section of a `DrugRegistered` log.
pub fn decode_drug_fields(data: &[u8]) -> Result<DrugFields, AbiError> {
    Ok(DrugFields {
        name: read_string(data, 0)?,
        batch: read_string(data, WORD)?,
        manufacturer: read_string(data, 2 * WORD)?,
        expiry: read_u64(data, 3 * WORD)?,
    })
}
