use crate::commands::{self, Endpoint};
use crate::config::Config;
use crate::envelope::Envelope;
use crate::error::{ConfigError, RelayError};
use crate::notify::Notifier;
use crate::request::CommandRequest;
use crate::vehicle_api::{ApiReply, VehicleApi, VehicleClient};
use crate::wake::{wake_vehicle, WakeOutcome, WakeSettings};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

/// Returned for GET requests.
pub const LIVENESS_MESSAGE: &str = "Tesla API Relay running successfully";

/// Handles one request at a time. Built once at startup and shared between requests.
pub struct Relay {
    api: Box<dyn VehicleApi>,
    notifier: Option<Notifier>,
    wake: WakeSettings,
}

impl Relay {
    pub fn new(api: Box<dyn VehicleApi>, notifier: Option<Notifier>, wake: WakeSettings) -> Self {
        Self { api, notifier, wake }
    }

    /// Builds the relay with a real HTTP client shared by the vehicle API and the notifier.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(config.upstream_timeout).build()?;

        let notifier = config
            .notify
            .clone()
            .map(|notify| Notifier::new(http.clone(), config.telegram_api_base.clone(), notify));

        Ok(Self::new(
            Box::new(VehicleClient::new(http, config.vehicle_api_base.clone())),
            notifier,
            config.wake,
        ))
    }

    /// Turns an inbound request into an envelope. Never fails: every error becomes an envelope.
    /// Failures are also sent to the notification chat, if one is configured.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> Envelope {
        let envelope = if method == Method::GET {
            Envelope::ok("", LIVENESS_MESSAGE)
        } else if method == Method::POST {
            self.handle_post(body).await
        } else {
            Envelope::from_error("", &RelayError::UnsupportedMethod(method.to_string()))
        };

        self.report(envelope).await
    }

    /// Turns a request the trigger could not decode into an error envelope.
    /// The failure is reported the same way as the ones found by [Relay::handle].
    pub async fn reject(&self, err: RelayError) -> Envelope {
        self.report(Envelope::from_error("", &err)).await
    }

    async fn report(&self, envelope: Envelope) -> Envelope {
        if !envelope.is_success() {
            warn!("Request failed: {}", envelope.to_json());
            if let Some(notifier) = &self.notifier {
                notifier.notify(&envelope).await;
            }
        }

        envelope
    }

    async fn handle_post(&self, body: &[u8]) -> Envelope {
        let request = match CommandRequest::from_slice(body) {
            Ok(v) => v,
            Err(e) => return Envelope::from_error("", &e),
        };

        match self.execute(&request).await {
            Ok(()) => {
                info!("Command {} executed", request.input_cmd);
                Envelope::ok(
                    request.input_cmd.as_str(),
                    format!("Command {} executed successfully", request.input_cmd),
                )
            }
            Err(e) => Envelope::from_error(request.input_cmd.as_str(), &e),
        }
    }

    async fn execute(&self, request: &CommandRequest) -> Result<(), RelayError> {
        let command =
            commands::lookup(&request.input_cmd).ok_or_else(|| RelayError::UnknownCommand(request.input_cmd.clone()))?;

        // build the body first so that a missing field does not cost a wake-up
        let body = command.build_body(request)?;

        if request.force_wakeup {
            match wake_vehicle(self.api.as_ref(), &request.token, &request.vehicle_id, &self.wake).await? {
                WakeOutcome::Online => {}
                WakeOutcome::TimedOut { waited } => return Err(RelayError::WakeTimedOut(waited)),
                WakeOutcome::MalformedUpstreamResponse(payload) => {
                    return Err(RelayError::MalformedWakeResponse(payload))
                }
            }
        }

        info!("Sending {} as {} to vehicle {}", command.name, command.vendor, request.vehicle_id);

        let endpoint = command.endpoint();
        let reply = match endpoint {
            Endpoint::WakeUp => self.api.wake_up(&request.token, &request.vehicle_id).await?,
            Endpoint::Command(vendor) => {
                self.api
                    .command(&request.token, &request.vehicle_id, vendor, &body)
                    .await?
            }
        };

        classify(endpoint, reply)
    }
}

/// Decides if a vehicle API reply means the command was executed.
/// An HTTP success is not enough: commands must come back with a truthy `response.result`.
/// A `wake_up` reply carries the vehicle state instead and counts if `response.state` is there.
pub fn classify(endpoint: Endpoint, reply: ApiReply) -> Result<(), RelayError> {
    if reply.status == StatusCode::UNAUTHORIZED {
        return Err(RelayError::Unauthorized);
    }

    if !reply.status.is_success() {
        return Err(RelayError::Upstream(reply.payload));
    }

    let result = reply.payload.pointer("/response/result");
    let executed = match endpoint {
        Endpoint::WakeUp => match result {
            Some(result) => is_truthy(result),
            None => reply
                .payload
                .pointer("/response/state")
                .is_some_and(|state| !state.is_null()),
        },
        Endpoint::Command(_) => result.is_some_and(is_truthy),
    };

    if !executed {
        return Err(RelayError::Upstream(reply.payload));
    }

    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(v) => *v,
        Value::Number(v) => v.as_f64().is_some_and(|v| v != 0.0),
        Value::String(v) => !v.is_empty(),
        Value::Array(v) => !v.is_empty(),
        Value::Object(v) => !v.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, payload: Value) -> ApiReply {
        ApiReply {
            status: StatusCode::from_u16(status).unwrap(),
            payload,
        }
    }

    const HONK: Endpoint = Endpoint::Command("honk_horn");

    #[test]
    fn success_with_truthy_result() {
        assert!(classify(HONK, reply(200, json!({"response": {"result": true, "reason": ""}}))).is_ok());
        assert!(classify(Endpoint::WakeUp, reply(200, json!({"response": {"result": true}}))).is_ok());
    }

    #[test]
    fn wake_up_succeeds_with_a_state() {
        assert!(classify(Endpoint::WakeUp, reply(200, json!({"response": {"state": "asleep"}}))).is_ok());

        for payload in [json!({"response": {"state": null}}), json!({"response": null}), json!("<html>")] {
            let err = classify(Endpoint::WakeUp, reply(200, payload)).unwrap_err();
            assert!(matches!(err, RelayError::Upstream(_)));
        }
    }

    #[test]
    fn command_without_result_is_an_upstream_error() {
        for payload in [
            json!("<html>gateway</html>"),
            json!({"response": null, "error": "vehicle unavailable"}),
            json!({"response": {"reason": "x"}}),
            json!({"response": {"state": "online"}}),
        ] {
            let err = classify(HONK, reply(200, payload.clone())).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
            assert_eq!(err.message(), json!({"Tesla API error": payload}));
        }
    }

    #[test]
    fn falsy_result_is_an_upstream_error() {
        let payload = json!({"response": {"result": false, "reason": "could_not_wake_buses"}});
        let err = classify(HONK, reply(200, payload.clone())).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), json!({"Tesla API error": payload}));

        for falsy in [json!(null), json!(0), json!("")] {
            let err = classify(HONK, reply(200, json!({"response": {"result": falsy}}))).unwrap_err();
            assert!(matches!(err, RelayError::Upstream(_)));
        }
    }

    #[test]
    fn unauthorized_ignores_the_payload() {
        for payload in [json!({"response": {"result": true}}), json!("<html>"), json!(null)] {
            let err = classify(HONK, reply(401, payload)).unwrap_err();
            assert!(matches!(err, RelayError::Unauthorized));
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn other_error_statuses_wrap_the_payload() {
        let payload = json!({"response": null, "error": "vehicle unavailable", "error_description": ""});
        let err = classify(HONK, reply(408, payload.clone())).unwrap_err();
        assert_eq!(err.message(), json!({"Tesla API error": payload}));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
