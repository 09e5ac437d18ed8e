use crate::commands::WAKE_UP;
use crate::error::RelayError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Status and decoded body of a vehicle API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: StatusCode,
    /// The JSON body, or the raw text as a JSON string if the body was not JSON
    pub payload: Value,
}

/// The two calls the relay makes to the vehicle API.
/// Only transport failures are errors here. HTTP error statuses come back as an [ApiReply].
#[async_trait]
pub trait VehicleApi: Send + Sync {
    /// POST `/{vehicle_id}/wake_up`
    async fn wake_up(&self, token: &str, vehicle_id: &str) -> Result<ApiReply, RelayError>;

    /// POST `/{vehicle_id}/command/{vendor_command}` with a JSON body
    async fn command(
        &self,
        token: &str,
        vehicle_id: &str,
        vendor_command: &str,
        body: &Value,
    ) -> Result<ApiReply, RelayError>;
}

/// HTTPS client for the vehicle API.
pub struct VehicleClient {
    http: Client,
    /// E.g. https://owner-api.teslamotors.com/api/1/vehicles
    base_url: String,
}

impl VehicleClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, token: &str, url: String, body: &Value) -> Result<ApiReply, RelayError> {
        debug!("POST {url}\n{body}");

        let resp = self.http.post(&url).bearer_auth(token).json(body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!("Vehicle API response {status}: {text}");

        let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(ApiReply { status, payload })
    }
}

#[async_trait]
impl VehicleApi for VehicleClient {
    async fn wake_up(&self, token: &str, vehicle_id: &str) -> Result<ApiReply, RelayError> {
        let url = format!("{}/{}/{}", self.base_url, vehicle_id, WAKE_UP);
        self.post(token, url, &Value::Object(Default::default())).await
    }

    async fn command(
        &self,
        token: &str,
        vehicle_id: &str,
        vendor_command: &str,
        body: &Value,
    ) -> Result<ApiReply, RelayError> {
        let url = format!("{}/{}/command/{}", self.base_url, vehicle_id, vendor_command);
        self.post(token, url, body).await
    }
}
