//! Failure notifications sent to a Telegram chat.

use crate::envelope::Envelope;
use crate::error::{ConfigError, UPSTREAM_ERROR_KEY};
use crate::request::Setting;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

/// The upstream error text that means the vehicle is asleep or out of reach.
const VEHICLE_UNAVAILABLE: &str = "vehicle unavailable";

/// Bot credentials from the notification config file, e.g.
/// `{"token": "123456:ABC-DEF", "chatId": 987654321}`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    pub token: String,
    /// Numeric chat ID or `@channelusername`
    #[serde(rename = "chatId")]
    pub chat_id: Setting,
}

impl NotifyConfig {
    /// Reads the config file. A missing file means notifications are off and is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No notification config at {}. Notifications are off.", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::NotifyFileRead {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::NotifyFileParse {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Some(config))
    }
}

/// Sends failure envelopes to the configured chat via the Bot API.
pub struct Notifier {
    http: Client,
    /// E.g. https://api.telegram.org
    api_base: String,
    config: NotifyConfig,
}

impl Notifier {
    pub fn new(http: Client, api_base: impl Into<String>, config: NotifyConfig) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Sends a message about a failed request. Failures are logged and swallowed.
    pub async fn notify(&self, envelope: &Envelope) {
        let text = compose_message(envelope);
        debug!("Notification: {text}");

        if let Err(e) = self.send(&text).await {
            warn!("Failed to send notification: {e}");
        }
    }

    async fn send(&self, text: &str) -> Result<(), reqwest::Error> {
        // the token is part of the URL and must not be logged
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.token);

        self.http
            .post(url)
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
            }))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(reqwest::Error::without_url)?;

        Ok(())
    }
}

/// A friendly text if the vehicle was asleep, the serialized envelope otherwise.
pub fn compose_message(envelope: &Envelope) -> String {
    let asleep = envelope
        .msg
        .get(UPSTREAM_ERROR_KEY)
        .and_then(|payload| payload.get("error"))
        .and_then(|error| error.as_str())
        .is_some_and(|error| error.contains(VEHICLE_UNAVAILABLE));

    if asleep {
        format!(
            "Couldn't execute the command `{}` because your vehicle seems to be asleep.",
            envelope.command
        )
    } else {
        envelope.to_json()
    }
}
