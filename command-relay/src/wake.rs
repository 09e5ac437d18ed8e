//! The wake-up gate: makes sure the vehicle is online before the real command is sent.

use crate::error::RelayError;
use crate::vehicle_api::VehicleApi;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(5);

/// Timing of the wake-up polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeSettings {
    /// Delay between two wake-up requests
    pub poll_interval: Duration,
    /// The loop gives up once the total delay is strictly greater than this value
    pub timeout: Duration,
    /// Extra delay after the vehicle reported `online`
    pub settle: Duration,
}

impl Default for WakeSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            settle: DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WakeOutcome {
    /// The vehicle is online and had time to settle
    Online,
    /// Contains the total time spent waiting between polls
    TimedOut { waited: Duration },
    /// Contains the response that had no `response.state` field
    MalformedUpstreamResponse(Value),
}

/// Sends wake-up requests until the vehicle reports `online` or the timeout is exceeded.
/// Returns an error only for transport failures and rejected credentials.
pub async fn wake_vehicle(
    api: &dyn VehicleApi,
    token: &str,
    vehicle_id: &str,
    settings: &WakeSettings,
) -> Result<WakeOutcome, RelayError> {
    let mut waited = Duration::ZERO;

    loop {
        let reply = api.wake_up(token, vehicle_id).await?;

        if reply.status == StatusCode::UNAUTHORIZED {
            return Err(RelayError::Unauthorized);
        }

        let state = match reply.payload.pointer("/response/state").and_then(Value::as_str) {
            Some(v) => v.to_owned(),
            None => {
                warn!("No response.state in wake_up response: {}", reply.payload);
                return Ok(WakeOutcome::MalformedUpstreamResponse(reply.payload));
            }
        };

        if state == "online" {
            info!("Vehicle {vehicle_id} is online after {}s", waited.as_secs());
            // the vehicle may reject commands for a few seconds after waking up
            sleep(settings.settle).await;
            return Ok(WakeOutcome::Online);
        }

        debug!("Vehicle {vehicle_id} is {state}, waited {}s", waited.as_secs());
        sleep(settings.poll_interval).await;
        waited += settings.poll_interval;

        if waited > settings.timeout {
            warn!("Vehicle {vehicle_id} did not wake up in {}s", waited.as_secs());
            return Ok(WakeOutcome::TimedOut { waited });
        }
    }
}
