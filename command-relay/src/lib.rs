//! A relay between callers that know logical vehicle commands, e.g. `actuate_frunk`,
//! and the remote vehicle API that expects vendor endpoints and bodies.
//!
//! [Relay::handle] takes the HTTP method and the raw body of an inbound request and always
//! returns an [Envelope]. The HTTP triggers in `relay-server` and `relay-lambda` only convert
//! between their transport and these two.

pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod notify;
pub mod relay;
pub mod request;
pub mod vehicle_api;
pub mod wake;

pub use config::Config;
pub use envelope::Envelope;
pub use error::{ConfigError, RelayError};
pub use relay::{Relay, LIVENESS_MESSAGE};
pub use reqwest::Method;
