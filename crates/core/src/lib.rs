//! Safe MultiSend batching: validation and packed encoding of call batches,
//! Safe transaction assembly and EIP-712 hashing.

pub mod actions;
pub mod bindings;
pub mod types;
pub mod utils;

pub use actions::multisend_utils::{
    MultiSendError, PackedCall, create_multisend_data, decode_multisend_data,
    decode_packed_calls, encode_multisend_calldata, encode_packed_call, pack_calls,
};
pub use actions::owner_action::{ApprovalState, OwnerAction};
pub use actions::safe_transaction::SafeTransaction;
pub use types::call::{Call, CallRequest, CallValue};
pub use types::operation::Operation;
pub use utils::eip712::safe_tx_hash;
pub use utils::validation::{CallError, ValidationError, validate_call, validate_call_batch};
