use alloy::primitives::{Address, Bytes, U256};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;

/// A Safe transaction as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTxConfig {
    pub network_id: u64,
    pub multisig: String,
    pub to: String,
    pub value: String,
    pub data: String,
    pub operation: u8,
    pub nonce: u64,
}

impl SafeTxConfig {
    pub fn from_file(file_path: &str) -> Result<Self> {
        let file_content = fs::read_to_string(file_path)?;
        let config: SafeTxConfig = serde_json::from_str(&file_content)?;
        Ok(config)
    }

    pub fn to_file(&self, file_path: &str) -> Result<()> {
        fs::write(file_path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn multisig(&self) -> Result<Address> {
        self.multisig
            .parse()
            .map_err(|e| eyre!("Failed to parse multisig {}: {}", self.multisig, e))
    }

    pub fn to(&self) -> Result<Address> {
        self.to
            .parse()
            .map_err(|e| eyre!("Failed to parse to {}: {}", self.to, e))
    }

    pub fn value(&self) -> Result<U256> {
        self.value
            .parse::<U256>()
            .map_err(|e| eyre!("Failed to parse value {}: {}", self.value, e))
    }

    pub fn data(&self) -> Result<Bytes> {
        self.data
            .parse::<Bytes>()
            .map_err(|e| eyre!("Failed to parse data: {}", e))
    }
}
