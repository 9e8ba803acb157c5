use super::multisend_utils::create_multisend_data;
use crate::types::call::Call;
use crate::types::operation::Operation;
use crate::types::safe_tx_config::SafeTxConfig;
use alloy::primitives::{Address, Bytes, U256};
use eyre::{Result, eyre};
use log::debug;
use serde_json::{Value, json};

/// The transaction a Safe executes for a batch of calls.
///
/// A single call is executed directly. Several calls are routed through a
/// MultiSend contract with a delegatecall, so every inner call is made by
/// the Safe itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
    multisend: Option<Address>,
    calls: Vec<Call>,
}

impl SafeTransaction {
    pub fn from_calls(calls: Vec<Call>, multisend: Option<Address>, nonce: U256) -> Result<Self> {
        match calls.len() {
            0 => Err(eyre!("SafeTransaction: Empty calls")),
            1 => {
                debug!("Single call, executing directly");
                let call = calls[0].clone();
                Ok(
                    Self::from_parts(call.to, call.value, call.data, Operation::Call, nonce)
                        .with_calls(None, calls),
                )
            }
            n => {
                let multisend = multisend.ok_or_else(|| {
                    eyre!(
                        "SafeTransaction: multisend is not defined and call length is {}",
                        n
                    )
                })?;
                debug!("Batching {} calls through MultiSend at {}", n, multisend);
                let data = create_multisend_data(&calls)?;
                Ok(
                    Self::from_parts(multisend, U256::ZERO, data, Operation::DelegateCall, nonce)
                        .with_calls(Some(multisend), calls),
                )
            }
        }
    }

    /// A Safe transaction with zeroed gas and refund settings.
    pub fn from_parts(
        to: Address,
        value: U256,
        data: Bytes,
        operation: Operation,
        nonce: U256,
    ) -> Self {
        Self {
            to,
            value,
            data,
            operation,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce,
            multisend: None,
            calls: Vec::new(),
        }
    }

    pub fn from_config(config: &SafeTxConfig) -> Result<Self> {
        let operation = Operation::try_from(config.operation)
            .map_err(|op| eyre!("SafeTransaction: unknown operation {}", op))?;
        Ok(Self::from_parts(
            config.to()?,
            config.value()?,
            config.data()?,
            operation,
            U256::from(config.nonce),
        ))
    }

    fn with_calls(mut self, multisend: Option<Address>, calls: Vec<Call>) -> Self {
        self.multisend = multisend;
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn to_config(&self, network_id: u64, safe: Address) -> Result<SafeTxConfig> {
        Ok(SafeTxConfig {
            network_id,
            multisig: safe.to_checksum(None),
            to: self.to.to_checksum(None),
            value: self.value.to_string(),
            data: format!("0x{}", hex::encode(&self.data)),
            operation: self.operation.as_u8(),
            nonce: u64::try_from(self.nonce)
                .map_err(|_| eyre!("SafeTransaction: nonce {} does not fit in u64", self.nonce))?,
        })
    }

    pub fn describe(&self) -> Value {
        let inner = self.calls.iter().map(Call::describe).collect::<Vec<_>>();
        match self.multisend {
            Some(multisend) => json!({
                "action": "MultiSend",
                "multisend": multisend.to_checksum(None),
                "nonce": self.nonce.to_string(),
                "inner": inner
            }),
            None => json!({
                "action": "DirectCall",
                "nonce": self.nonce.to_string(),
                "inner": inner
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::multisend_utils::decode_multisend_data;
    use alloy::primitives::address;

    const MULTISEND: Address = address!("0x40A2aCCbd92BCA938b02010E17A5b8929b49130D");
    const SAFE: Address = address!("0x5F2F11ad8656439d5C14d9B351f8b09cDaC2A02d");

    fn call(byte: u8, value: u64) -> Call {
        Call::new(Address::repeat_byte(byte), U256::from(value), vec![byte])
    }

    #[test]
    fn test_single_call_is_direct() {
        let tx = SafeTransaction::from_calls(vec![call(0x11, 5)], Some(MULTISEND), U256::from(3))
            .unwrap();
        assert_eq!(tx.to, Address::repeat_byte(0x11));
        assert_eq!(tx.value, U256::from(5));
        assert_eq!(tx.data.as_ref(), &[0x11]);
        assert_eq!(tx.operation, Operation::Call);
        assert_eq!(tx.nonce, U256::from(3));
        assert_eq!(tx.describe()["action"], "DirectCall");
    }

    #[test]
    fn test_batch_uses_multisend_delegatecall() {
        let calls = vec![call(0x11, 5), call(0x22, 0)];
        let tx = SafeTransaction::from_calls(calls.clone(), Some(MULTISEND), U256::ZERO).unwrap();
        assert_eq!(tx.to, MULTISEND);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.operation, Operation::DelegateCall);
        assert_eq!(tx.gas_token, Address::ZERO);

        let decoded = decode_multisend_data(&tx.data).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].value, U256::from(5));
        assert_eq!(decoded[1].to, Address::repeat_byte(0x22));

        let description = tx.describe();
        assert_eq!(description["action"], "MultiSend");
        assert_eq!(description["inner"].as_array().unwrap().len(), 2);
        assert_eq!(tx.calls(), calls.as_slice());
    }

    #[test]
    fn test_batch_without_multisend_fails() {
        let result =
            SafeTransaction::from_calls(vec![call(0x11, 0), call(0x22, 0)], None, U256::ZERO);
        assert!(result.is_err());
        assert!(SafeTransaction::from_calls(vec![], Some(MULTISEND), U256::ZERO).is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let tx = SafeTransaction::from_calls(
            vec![call(0x11, 0), call(0x22, 9)],
            Some(MULTISEND),
            U256::from(12),
        )
        .unwrap();
        let config = tx.to_config(1, SAFE).unwrap();
        assert_eq!(config.multisig, "0x5F2F11ad8656439d5C14d9B351f8b09cDaC2A02d");
        assert_eq!(config.operation, 1);
        assert_eq!(config.nonce, 12);

        let restored = SafeTransaction::from_config(&config).unwrap();
        assert_eq!(restored.to, tx.to);
        assert_eq!(restored.data, tx.data);
        assert_eq!(restored.operation, tx.operation);
        assert_eq!(restored.nonce, tx.nonce);
    }
}
