//! Structural checks applied to caller supplied calls before any encoding.

use crate::types::call::{Call, CallRequest, CallValue};
use alloy::primitives::{Address, Bytes, U256};
use thiserror::Error;

/// Why a single call was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("Missing 'to' address")]
    MissingTo,
    #[error("Invalid 'to' address: {0}")]
    InvalidTo(String),
    #[error("Missing 'value'")]
    MissingValue,
    #[error("Invalid 'value': {0} is negative")]
    NegativeValue(String),
    #[error("Invalid 'value': {0} is not a non-negative integer")]
    InvalidValue(String),
    #[error("Invalid 'value': {0} does not fit in 256 bits")]
    ValueOverflow(String),
    #[error("Missing 'data'")]
    MissingData,
    #[error("Invalid 'data': {0} is not hex")]
    InvalidData(String),
    #[error("Invalid 'data': odd number of hex digits ({0})")]
    OddLengthData(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("At least one transaction is required")]
    EmptyBatch,
    /// `position` is the one-based place of the entry in its batch.
    #[error("Transaction {position}: {kind}")]
    Indexed { position: usize, kind: CallError },
    #[error(transparent)]
    Call(CallError),
}

impl ValidationError {
    fn at(index: Option<usize>, kind: CallError) -> Self {
        match index {
            Some(index) => ValidationError::Indexed {
                position: index + 1,
                kind,
            },
            None => ValidationError::Call(kind),
        }
    }

    /// Zero-based index of the offending entry, when known.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::Indexed { position, .. } => Some(position - 1),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&CallError> {
        match self {
            ValidationError::Indexed { kind, .. } | ValidationError::Call(kind) => Some(kind),
            ValidationError::EmptyBatch => None,
        }
    }
}

pub fn validate_call(request: &CallRequest, index: Option<usize>) -> Result<Call, ValidationError> {
    let to = parse_to(request.to.as_deref()).map_err(|e| ValidationError::at(index, e))?;
    let value = parse_value(request.value.as_ref()).map_err(|e| ValidationError::at(index, e))?;
    let data = parse_data(request.data.as_deref()).map_err(|e| ValidationError::at(index, e))?;
    Ok(Call { to, value, data })
}

/// Validates every entry in order and stops at the first failure.
pub fn validate_call_batch(requests: &[CallRequest]) -> Result<Vec<Call>, ValidationError> {
    if requests.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    requests
        .iter()
        .enumerate()
        .map(|(i, request)| validate_call(request, Some(i)))
        .collect()
}

fn parse_to(to: Option<&str>) -> Result<Address, CallError> {
    let raw = match to.map(str::trim) {
        None | Some("") => return Err(CallError::MissingTo),
        Some(raw) => raw,
    };
    let address = raw
        .parse::<Address>()
        .map_err(|_| CallError::InvalidTo(raw.to_string()))?;

    // Mixed case input has to carry a correct EIP-55 checksum.
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return Err(CallError::InvalidTo(raw.to_string()));
    }
    Ok(address)
}

fn parse_value(value: Option<&CallValue>) -> Result<U256, CallError> {
    match value {
        None => Err(CallError::MissingValue),
        // Number literals keep their exact digits, so they share the text rules.
        Some(CallValue::Number(s)) | Some(CallValue::Text(s)) => parse_text(s),
    }
}

fn parse_text(raw: &str) -> Result<U256, CallError> {
    let s = raw.trim();
    let (negative, magnitude) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let well_formed = match magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => !magnitude.is_empty() && magnitude.chars().all(|c| c.is_ascii_digit()),
    };
    if !well_formed {
        return Err(CallError::InvalidValue(raw.to_string()));
    }
    // Only overflow can fail past the syntax check.
    let value = magnitude.parse::<U256>().map_err(|_| {
        if negative {
            CallError::NegativeValue(raw.to_string())
        } else {
            CallError::ValueOverflow(raw.to_string())
        }
    })?;
    if negative && !value.is_zero() {
        return Err(CallError::NegativeValue(raw.to_string()));
    }
    Ok(value)
}

fn parse_data(data: Option<&str>) -> Result<Bytes, CallError> {
    let raw = data.ok_or(CallError::MissingData)?;
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.len() % 2 != 0 {
        return Err(CallError::OddLengthData(digits.len()));
    }
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|_| CallError::InvalidData(raw.to_string()))
}
