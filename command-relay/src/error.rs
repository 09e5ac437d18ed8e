use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// The key under which a raw vehicle API payload is wrapped in the envelope `msg`.
pub const UPSTREAM_ERROR_KEY: &str = "Tesla API error";

/// The fixed message for rejected vehicle API credentials.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Access Token or Vehicle ID seems to be wrong!";

/// Every way a request can fail. Each variant maps onto one HTTP status code
/// and one envelope message, see [RelayError::status_code] and [RelayError::message].
#[derive(Error, Debug)]
pub enum RelayError {
    /// The request body is not a valid command request
    #[error("Validation error {0}")]
    Validation(String),

    /// INPUT_CMD is not in the command table
    #[error("Unknown command {0}")]
    UnknownCommand(String),

    #[error("Unsupported method {0}")]
    UnsupportedMethod(String),

    /// The vehicle API rejected the token or the vehicle ID
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// The vehicle API failed or reported a falsy result. Contains the raw payload.
    #[error("Tesla API error: {0}")]
    Upstream(Value),

    /// The vehicle did not report `online` before the wake-up ceiling was exceeded
    #[error("Vehicle did not come online within {}s", .0.as_secs())]
    WakeTimedOut(Duration),

    /// The wake-up response had no `response.state` field
    #[error("Unexpected wake_up response: {0}")]
    MalformedWakeResponse(Value),

    /// DNS, TLS, connection or timeout errors talking to the vehicle API
    #[error("Server error {0}")]
    Transport(#[from] reqwest::Error),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownCommand(_) | Self::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::WakeTimedOut(_) | Self::MalformedWakeResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The envelope `msg`: a structured payload for upstream errors, plain text for the rest.
    pub fn message(&self) -> Value {
        match self {
            Self::Upstream(payload) => json!({ UPSTREAM_ERROR_KEY: payload }),
            _ => Value::String(self.to_string()),
        }
    }
}

/// Errors loading the relay configuration at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value in {name} env var: {value}. {hint}")]
    InvalidVar {
        name: &'static str,
        value: String,
        hint: &'static str,
    },

    #[error("Failed to read notification config from {path}: {source}")]
    NotifyFileRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid notification config in {path}: {source}")]
    NotifyFileParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to build the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
