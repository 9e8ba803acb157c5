use super::operation::Operation;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer, de::Error};
use serde_json::value::RawValue;
use serde_json::{Value, json};

/// A call exactly as supplied by the caller, before validation.
///
/// Every field is optional so that missing entries surface as validation
/// errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<CallValue>,
    #[serde(default)]
    pub data: Option<String>,
}

impl CallRequest {
    pub fn new(
        to: impl Into<String>,
        value: impl Into<CallValue>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            to: Some(to.into()),
            value: Some(value.into()),
            data: Some(data.into()),
        }
    }
}

/// Native currency amount, either as text (decimal or `0x` hex) or as a JSON number.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Text(String),
    /// The number literal exactly as written, so integers wider than 64 bits keep every digit.
    Number(String),
}

impl<'de> Deserialize<'de> for CallValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get().trim();
        if text.starts_with('"') {
            serde_json::from_str::<String>(text)
                .map(CallValue::Text)
                .map_err(D::Error::custom)
        } else if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            Ok(CallValue::Number(text.to_string()))
        } else {
            Err(D::Error::custom(format!(
                "Invalid value: expected a string or an integer, got {}",
                text
            )))
        }
    }
}

impl From<&str> for CallValue {
    fn from(value: &str) -> Self {
        CallValue::Text(value.to_string())
    }
}

impl From<String> for CallValue {
    fn from(value: String) -> Self {
        CallValue::Text(value)
    }
}

impl From<u64> for CallValue {
    fn from(value: u64) -> Self {
        CallValue::Number(value.to_string())
    }
}

impl From<i64> for CallValue {
    fn from(value: i64) -> Self {
        CallValue::Number(value.to_string())
    }
}

/// A validated call, ready to be packed into a MultiSend batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value,
            data: data.into(),
        }
    }

    // Batched entries never delegate.
    pub const fn operation(&self) -> Operation {
        Operation::Call
    }

    pub fn describe(&self) -> Value {
        json!({
            "to": self.to.to_checksum(None),
            "value": self.value.to_string(),
            "data": format!("0x{}", hex::encode(&self.data)),
        })
    }
}
