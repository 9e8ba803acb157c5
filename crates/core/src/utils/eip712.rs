//! EIP-712 hashing of Safe transactions (Safe v1.3.0 and later).

use crate::actions::safe_transaction::SafeTransaction;
use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};

sol! {
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }
}

impl From<&SafeTransaction> for SafeTx {
    fn from(tx: &SafeTransaction) -> Self {
        SafeTx {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            operation: tx.operation.as_u8(),
            safeTxGas: tx.safe_tx_gas,
            baseGas: tx.base_gas,
            gasPrice: tx.gas_price,
            gasToken: tx.gas_token,
            refundReceiver: tx.refund_receiver,
            nonce: tx.nonce,
        }
    }
}

/// `EIP712Domain(uint256 chainId,address verifyingContract)` for a given Safe.
pub fn safe_domain(chain_id: u64, safe: Address) -> Eip712Domain {
    Eip712Domain::new(None, None, Some(U256::from(chain_id)), Some(safe), None)
}

pub fn domain_separator(chain_id: u64, safe: Address) -> B256 {
    safe_domain(chain_id, safe).separator()
}

/// The hash owners approve or sign, as returned by `getTransactionHash`.
pub fn safe_tx_hash(tx: &SafeTransaction, chain_id: u64, safe: Address) -> B256 {
    SafeTx::from(tx).eip712_signing_hash(&safe_domain(chain_id, safe))
}
