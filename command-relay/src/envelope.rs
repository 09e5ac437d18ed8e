use crate::error::RelayError;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// The normalized reply returned for every request, successful or not.
/// Serialized as `{"command": .., "msg": .., "statusCode": ..}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The logical command, or an empty string if the request never got that far
    pub command: String,
    /// A string or a structured upstream error payload
    pub msg: Value,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl Envelope {
    /// A 200 envelope with a text message.
    pub fn ok(command: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            msg: Value::String(msg.into()),
            status_code: StatusCode::OK.as_u16(),
        }
    }

    pub fn from_error(command: impl Into<String>, err: &RelayError) -> Self {
        Self {
            command: command.into(),
            msg: err.message(),
            status_code: err.status_code().as_u16(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == StatusCode::OK.as_u16()
    }

    pub fn to_json(&self) -> String {
        // a struct of a string, a Value and a number always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}
