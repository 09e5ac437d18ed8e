use crate::error::RelayError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// A caller-supplied value that may arrive as a JSON number or a string.
/// It is forwarded to the vehicle API exactly as it was received.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Setting {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// The POST body sent by the caller.
/// Field names are the upper-case names the callers already use.
#[derive(Deserialize, Debug, Clone)]
pub struct CommandRequest {
    /// Bearer token for the vehicle API, passed through as-is
    #[serde(rename = "TOKEN")]
    pub token: String,
    /// Numeric IDs are accepted and converted to text
    #[serde(rename = "VEHICLE_ID", deserialize_with = "setting_to_string")]
    pub vehicle_id: String,
    /// Logical command name, a key of the command table
    #[serde(rename = "INPUT_CMD")]
    pub input_cmd: String,
    #[serde(rename = "VEHICLE_TEMP", default)]
    pub vehicle_temp: Option<Setting>,
    #[serde(rename = "VEHICLE_CHARGE_LIMIT", default)]
    pub vehicle_charge_limit: Option<Setting>,
    #[serde(rename = "FORCE_WAKEUP", default)]
    pub force_wakeup: bool,
}

fn setting_to_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Setting::deserialize(deserializer).map(|v| v.to_string())
}

impl CommandRequest {
    /// Parses and validates the raw request body.
    /// Does not check INPUT_CMD against the command table.
    pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
        if let Err(e) = std::str::from_utf8(body) {
            warn!("Non-UTF-8 request body. {:?}\n{}", e, hex::encode(body));
            return Err(RelayError::Validation("request body is not valid UTF-8".to_string()));
        }

        let request: Self = serde_json::from_slice(body).map_err(|e| RelayError::Validation(e.to_string()))?;

        if request.token.trim().is_empty() {
            return Err(RelayError::Validation("TOKEN must not be empty".to_string()));
        }
        if request.input_cmd.trim().is_empty() {
            return Err(RelayError::Validation("INPUT_CMD must not be empty".to_string()));
        }
        // the ID becomes a URL path segment
        if request.vehicle_id.is_empty()
            || !request
                .vehicle_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RelayError::Validation(format!(
                "VEHICLE_ID must be a non-empty alphanumeric value: {:?}",
                request.vehicle_id
            )));
        }

        Ok(request)
    }
}
