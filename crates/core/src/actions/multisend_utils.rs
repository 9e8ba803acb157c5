//! Packed MultiSend encoding.
//!
//! Each entry is laid out as
//! `operation (1) | to (20) | value (32) | data length (32) | data`,
//! with integers big-endian and entries concatenated in batch order. The
//! packed blob is then passed as the single `bytes` argument of
//! `multiSend(bytes)`.

use crate::bindings::multisend::MultiSendCallOnly;
use crate::types::call::{Call, CallRequest};
use crate::types::operation::Operation;
use crate::utils::validation::{ValidationError, validate_call_batch};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use thiserror::Error;

/// Size of an entry without its payload.
pub const PACKED_HEADER_LEN: usize = 1 + 20 + 32 + 32;

#[derive(Debug, Error)]
pub enum MultiSendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("MultiSend: truncated entry at offset {offset}: need {needed} bytes, {available} left")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("MultiSend: unknown operation {operation} at offset {offset}")]
    UnknownOperation { offset: usize, operation: u8 },
    #[error("MultiSend: invalid multiSend calldata: {0}")]
    Abi(#[from] alloy::sol_types::Error),
}

/// An entry recovered from a packed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedCall {
    pub operation: Operation,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

pub fn encode_packed_call(call: &Call, out: &mut Vec<u8>) {
    // operation (0 for Call) - 1 byte
    out.push(call.operation().as_u8());

    // to address - 20 bytes
    out.extend_from_slice(call.to.as_slice());

    // value - 32 bytes
    out.extend_from_slice(&call.value.to_be_bytes::<32>());

    // data length - 32 bytes
    let data_len = U256::from(call.data.len());
    out.extend_from_slice(&data_len.to_be_bytes::<32>());

    // data - dynamic length
    out.extend_from_slice(&call.data);
}

pub fn pack_calls(calls: &[Call]) -> Bytes {
    let size = calls
        .iter()
        .map(|call| PACKED_HEADER_LEN + call.data.len())
        .sum();
    let mut encoded_transactions = Vec::with_capacity(size);
    for call in calls {
        encode_packed_call(call, &mut encoded_transactions);
    }
    Bytes::from(encoded_transactions)
}

/// ABI encoded `multiSend(bytes)` calldata for an already validated batch.
pub fn create_multisend_data(calls: &[Call]) -> Result<Bytes, MultiSendError> {
    if calls.is_empty() {
        return Err(ValidationError::EmptyBatch.into());
    }
    let multisend_data = MultiSendCallOnly::multiSendCall::new((pack_calls(calls),)).abi_encode();
    Ok(Bytes::from(multisend_data))
}

/// Validates raw call requests and returns `0x` prefixed `multiSend(bytes)` calldata.
pub fn encode_multisend_calldata(requests: &[CallRequest]) -> Result<String, MultiSendError> {
    let calls = validate_call_batch(requests)?;
    let data = create_multisend_data(&calls)?;
    Ok(format!("0x{}", hex::encode(data)))
}

pub fn decode_packed_calls(packed: &[u8]) -> Result<Vec<PackedCall>, MultiSendError> {
    let mut calls = Vec::new();
    let mut offset = 0;
    while offset < packed.len() {
        let available = packed.len() - offset;
        if available < PACKED_HEADER_LEN {
            return Err(MultiSendError::Truncated {
                offset,
                needed: PACKED_HEADER_LEN,
                available,
            });
        }
        let entry = &packed[offset..];

        let operation = Operation::try_from(entry[0])
            .map_err(|operation| MultiSendError::UnknownOperation { offset, operation })?;
        let to = Address::from_slice(&entry[1..21]);
        let value = U256::from_be_slice(&entry[21..53]);
        let data_len = U256::from_be_slice(&entry[53..85]);

        let body = available - PACKED_HEADER_LEN;
        let data_len = match usize::try_from(data_len) {
            Ok(len) if len <= body => len,
            other => {
                return Err(MultiSendError::Truncated {
                    offset,
                    needed: other
                        .map_or(usize::MAX, |len| len.saturating_add(PACKED_HEADER_LEN)),
                    available,
                });
            }
        };
        let data = Bytes::copy_from_slice(&entry[PACKED_HEADER_LEN..PACKED_HEADER_LEN + data_len]);

        calls.push(PackedCall {
            operation,
            to,
            value,
            data,
        });
        offset += PACKED_HEADER_LEN + data_len;
    }
    Ok(calls)
}

/// Decodes full `multiSend(bytes)` calldata, selector included.
pub fn decode_multisend_data(calldata: &[u8]) -> Result<Vec<PackedCall>, MultiSendError> {
    let call = MultiSendCallOnly::multiSendCall::abi_decode(calldata, true)?;
    decode_packed_calls(&call.transactions)
}
