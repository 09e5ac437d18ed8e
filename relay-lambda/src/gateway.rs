//! Conversion between API Gateway / function URL proxy events and the relay.
//!
//! Supported event shapes:
//! - REST API (v1): `{"httpMethod": "POST", "body": "...", "isBase64Encoded": false, ..}`
//! - HTTP API and function URLs (v2): `{"requestContext": {"http": {"method": "POST"}}, "body": "..", ..}`
//! - direct invocation with the command request itself as the payload, treated as a POST

use base64::Engine;
use command_relay::{Envelope, Method, Relay, RelayError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ProxyEvent {
    http_method: Option<String>,
    request_context: Option<RequestContext>,
    body: Option<String>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Deserialize, Debug, Default)]
struct RequestContext {
    http: Option<HttpContext>,
}

#[derive(Deserialize, Debug, Default)]
struct HttpContext {
    method: String,
}

/// The parts of an inbound event the relay needs.
#[derive(Debug, PartialEq)]
pub(crate) struct InboundRequest {
    pub method: Method,
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Extracts the method and the raw body from a proxy event.
    /// Returns an error message if the event claims to be base64 encoded but is not.
    pub(crate) fn from_event(event: Value) -> Result<Self, String> {
        let proxy: ProxyEvent = serde_json::from_value(event.clone()).unwrap_or_default();

        let method = match (proxy.http_method, proxy.request_context.and_then(|ctx| ctx.http)) {
            (Some(method), _) => method,
            (None, Some(http)) => http.method,
            (None, None) => {
                debug!("No HTTP method in the event: treating it as a direct invocation");
                return Ok(Self {
                    method: Method::POST,
                    body: event.to_string().into_bytes(),
                });
            }
        };

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|e| format!("Invalid HTTP method {method}: {e}"))?;

        let body = match proxy.body {
            Some(body) if proxy.is_base64_encoded => base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|e| format!("Invalid base64 body: {e}"))?,
            Some(body) => body.into_bytes(),
            None => Vec::new(),
        };

        Ok(Self { method, body })
    }
}

/// Runs one invocation through the relay. Events that cannot be decoded are rejected
/// through the relay as well, so they are reported like any other failure.
pub(crate) async fn invoke(relay: &Relay, event: Value) -> Envelope {
    match InboundRequest::from_event(event) {
        Ok(req) => relay.handle(&req.method, &req.body).await,
        Err(e) => relay.reject(RelayError::Validation(e)).await,
    }
}

/// Wraps the envelope into a proxy integration response.
pub(crate) fn proxy_response(envelope: &Envelope) -> Value {
    json!({
        "statusCode": envelope.status_code,
        "headers": { "Content-Type": "application/json" },
        "body": envelope.to_json(),
        "isBase64Encoded": false,
    })
}
