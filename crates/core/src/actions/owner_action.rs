//! Outer Safe calls an owner makes once a Safe transaction hash is known.

use super::safe_transaction::SafeTransaction;
use crate::bindings::multisig::GnosisSafe;
use alloy::primitives::{Address, B256, Bytes};
use alloy::sol_types::SolCall;
use eyre::{Result, eyre};
use serde_json::{Value, json};

/// Approval state of a Safe for one transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalState {
    pub owners: Vec<Address>,
    pub threshold: usize,
    /// Owners that already called `approveHash` for the hash.
    pub approved: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerAction {
    ApproveHash { safe_hash: B256 },
    ExecTransaction { signatures: Bytes },
}

impl OwnerAction {
    /// Picks what `signer` should send next.
    ///
    /// Executes when the threshold is met, or when the signer's own
    /// approval is the last one missing; otherwise approves.
    pub fn plan(state: &ApprovalState, signer: Address, safe_hash: B256) -> Result<Self> {
        if !state.owners.contains(&signer) {
            return Err(eyre!("OwnerAction: Signer is not an owner"));
        }
        if state.threshold == 0 {
            return Err(eyre!("OwnerAction: Safe threshold is zero"));
        }

        let mut approvers: Vec<Address> = state
            .approved
            .iter()
            .copied()
            .filter(|approver| state.owners.contains(approver))
            .collect();
        approvers.sort();
        approvers.dedup();

        let signer_signed = approvers.contains(&signer);
        let signature_count = approvers.len();

        if signature_count >= state.threshold {
            // We have enough signatures.
            Ok(OwnerAction::ExecTransaction {
                signatures: prevalidated_signatures(&approvers, state.threshold)?,
            })
        } else if signature_count == state.threshold - 1 && !signer_signed {
            // Missing one signature but signer can sign.
            approvers.push(signer);
            approvers.sort();
            Ok(OwnerAction::ExecTransaction {
                signatures: prevalidated_signatures(&approvers, state.threshold)?,
            })
        } else if !signer_signed {
            Ok(OwnerAction::ApproveHash { safe_hash })
        } else {
            Err(eyre!(
                "OwnerAction: Signer already approved, but not enough signers."
            ))
        }
    }

    pub fn calldata(&self, tx: &SafeTransaction) -> Bytes {
        match self {
            OwnerAction::ApproveHash { safe_hash } => approve_hash_calldata(*safe_hash),
            OwnerAction::ExecTransaction { signatures } => {
                exec_transaction_calldata(tx, signatures.clone())
            }
        }
    }

    pub fn describe(&self, safe: Address, safe_hash: B256, tx: &SafeTransaction) -> Value {
        let action = match self {
            OwnerAction::ApproveHash { .. } => "ApproveHash",
            OwnerAction::ExecTransaction { .. } => "ExecTransaction",
        };
        json!({
            "action": action,
            "multisig": safe.to_checksum(None),
            "nonce": tx.nonce.to_string(),
            "safe_hash": safe_hash.to_string(),
            "inner": tx.describe()
        })
    }
}

/// One `v = 1` signature per approver, valid because the owner either sent
/// the transaction or approved its hash on chain.
///
/// Safe requires signatures sorted by owner, so `approvers` must be
/// ascending; the first `threshold` of them are used.
pub fn prevalidated_signatures(approvers: &[Address], threshold: usize) -> Result<Bytes> {
    if approvers.len() < threshold {
        return Err(eyre!(
            "OwnerAction: {} approvals for a threshold of {}",
            approvers.len(),
            threshold
        ));
    }
    if !approvers.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(eyre!("OwnerAction: approvers must be sorted and unique"));
    }
    let mut sig = Vec::with_capacity(threshold * 65);
    for owner in &approvers[..threshold] {
        // r
        sig.extend_from_slice(owner.into_word().as_slice());
        // s
        sig.extend_from_slice(&[0u8; 32]);
        // v
        sig.push(1);
    }
    Ok(Bytes::from(sig))
}

pub fn approve_hash_calldata(safe_hash: B256) -> Bytes {
    Bytes::from(GnosisSafe::approveHashCall::new((safe_hash,)).abi_encode())
}

pub fn exec_transaction_calldata(tx: &SafeTransaction, signatures: Bytes) -> Bytes {
    Bytes::from(
        GnosisSafe::execTransactionCall::new((
            tx.to,
            tx.value,
            tx.data.clone(),
            tx.operation.as_u8(),
            tx.safe_tx_gas,
            tx.base_gas,
            tx.gas_price,
            tx.gas_token,
            tx.refund_receiver,
            signatures,
        ))
        .abi_encode(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::call::Call;
    use alloy::primitives::U256;

    fn owner(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn state(threshold: usize, approved: &[u8]) -> ApprovalState {
        ApprovalState {
            owners: vec![owner(0x33), owner(0x11), owner(0x22)],
            threshold,
            approved: approved.iter().map(|b| owner(*b)).collect(),
        }
    }

    const HASH: B256 = B256::repeat_byte(0xaa);

    #[test]
    fn test_signer_must_be_owner() {
        assert!(OwnerAction::plan(&state(2, &[]), owner(0x44), HASH).is_err());
    }

    #[test]
    fn test_approve_when_more_signatures_needed() {
        let action = OwnerAction::plan(&state(3, &[0x11]), owner(0x22), HASH).unwrap();
        assert_eq!(action, OwnerAction::ApproveHash { safe_hash: HASH });
    }

    #[test]
    fn test_exec_when_signer_completes_threshold() {
        let action = OwnerAction::plan(&state(2, &[0x33]), owner(0x11), HASH).unwrap();
        let OwnerAction::ExecTransaction { signatures } = action else {
            panic!("expected ExecTransaction");
        };
        assert_eq!(signatures.len(), 130);
        // Sorted ascending: 0x11.. before 0x33..
        assert_eq!(&signatures[12..32], owner(0x11).as_slice());
        assert_eq!(&signatures[65 + 12..65 + 32], owner(0x33).as_slice());
        assert_eq!(signatures[64], 1);
        assert!(signatures[32..64].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exec_when_threshold_met_uses_threshold_signatures() {
        let action = OwnerAction::plan(&state(2, &[0x33, 0x22, 0x11]), owner(0x11), HASH).unwrap();
        let OwnerAction::ExecTransaction { signatures } = action else {
            panic!("expected ExecTransaction");
        };
        assert_eq!(signatures.len(), 130);
        assert_eq!(&signatures[12..32], owner(0x11).as_slice());
        assert_eq!(&signatures[65 + 12..65 + 32], owner(0x22).as_slice());
    }

    #[test]
    fn test_already_approved_signer_cannot_progress() {
        assert!(OwnerAction::plan(&state(3, &[0x11]), owner(0x11), HASH).is_err());
    }

    #[test]
    fn test_prevalidated_signatures_require_order() {
        assert!(prevalidated_signatures(&[owner(0x22), owner(0x11)], 2).is_err());
        assert!(prevalidated_signatures(&[owner(0x11)], 2).is_err());
        assert_eq!(prevalidated_signatures(&[], 0).unwrap().len(), 0);
    }

    #[test]
    fn test_calldata_selectors() {
        let tx = SafeTransaction::from_calls(
            vec![Call::new(owner(0x55), U256::from(1), Vec::<u8>::new())],
            None,
            U256::ZERO,
        )
        .unwrap();

        let approve = OwnerAction::ApproveHash { safe_hash: HASH }.calldata(&tx);
        assert_eq!(&approve[..4], GnosisSafe::approveHashCall::SELECTOR.as_slice());
        assert_eq!(&approve[4..], HASH.as_slice());

        let exec = OwnerAction::ExecTransaction {
            signatures: prevalidated_signatures(&[owner(0x11)], 1).unwrap(),
        }
        .calldata(&tx);
        assert_eq!(&exec[..4], GnosisSafe::execTransactionCall::SELECTOR.as_slice());
        let decoded = GnosisSafe::execTransactionCall::abi_decode(&exec, true).unwrap();
        assert_eq!(decoded.to, owner(0x55));
        assert_eq!(decoded.value, U256::from(1));
        assert_eq!(decoded.signatures.len(), 65);
    }
}
