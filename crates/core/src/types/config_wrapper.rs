use alloy::primitives::{Address, address};
use dotenv::dotenv;
use eyre::{Result, eyre};
use std::{env, fs};
use toml::Value;

/// Canonical MultiSendCallOnly v1.3.0 deployment.
pub const DEFAULT_MULTISEND_ADDRESS: Address =
    address!("0x40A2aCCbd92BCA938b02010E17A5b8929b49130D");

pub struct ConfigWrapper {
    raw_config: Value,
}

impl ConfigWrapper {
    pub fn new(raw_config: Value) -> Self {
        Self { raw_config }
    }

    pub fn from_file(path: Option<&str>) -> Result<Self> {
        let config_content = if let Some(p) = path {
            fs::read_to_string(p)?
        } else {
            fs::read_to_string("config.toml")?
        };
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(config_content: &str) -> Result<Self> {
        let raw_config: Value = config_content.parse::<Value>()?;
        Ok(Self::new(raw_config))
    }

    /// An empty config, used when no `config.toml` is present.
    pub fn empty() -> Self {
        Self::new(Value::Table(Default::default()))
    }

    pub fn get_rpc_url(&self, network_id: u64) -> Result<String> {
        let url_str = self
            .raw_config
            .get("rpc_endpoints")
            .and_then(|r| r.get(network_id.to_string()))
            .and_then(|u| u.as_str())
            .ok_or_else(|| eyre!("URL not found for network_id: {}", network_id))?;

        if let Some(env_var) = url_str.strip_prefix("env:") {
            dotenv().ok();
            env::var(env_var).map_err(|_| eyre!("Environment variable {} not set", env_var))
        } else {
            Ok(url_str.to_string())
        }
    }

    pub fn get_multisend_address(&self, network_id: u64) -> Result<Address> {
        // Try network specific value first
        let network_value = self
            .raw_config
            .get("multi_send_address")
            .and_then(|m| m.get(network_id.to_string()))
            .and_then(|m| m.as_str());

        // Fallback to default if network specific not found
        let default_value = self
            .raw_config
            .get("multi_send_address")
            .and_then(|m| m.get("default"))
            .and_then(|m| m.as_str());

        match network_value.or(default_value) {
            Some(address_str) => address_str.parse().map_err(|e| {
                eyre!(
                    "Invalid multisend address {} for network_id {}: {}",
                    address_str,
                    network_id,
                    e
                )
            }),
            None => Ok(DEFAULT_MULTISEND_ADDRESS),
        }
    }
}
