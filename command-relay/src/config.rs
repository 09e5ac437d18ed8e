use crate::error::ConfigError;
use crate::notify::NotifyConfig;
use crate::wake::WakeSettings;
use core::net::SocketAddrV4;
use std::env::var;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_VEHICLE_API_BASE: &str = "https://owner-api.teslamotors.com/api/1/vehicles";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_NOTIFY_CONFIG: &str = "telegram_config.json";
const DEFAULT_LISTENER: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 7071);
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Config {
    /// E.g. 127.0.0.1:7071. Only used by the HTTP server trigger.
    pub listener: SocketAddrV4,
    /// E.g. https://owner-api.teslamotors.com/api/1/vehicles
    pub vehicle_api_base: String,
    /// E.g. https://api.telegram.org
    pub telegram_api_base: String,
    /// Bot credentials. Notifications are off if None.
    pub notify: Option<NotifyConfig>,
    pub wake: WakeSettings,
    /// Applies to every outbound HTTP call
    pub upstream_timeout: Duration,
}

impl Config {
    /// Creates a new Config instance from environment variables and defaults.
    /// Reads the notification config file if it exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| var(name).ok())
    }

    /// Same as [Config::from_env], but reads variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Azure custom handlers are told which port to listen on, which takes priority over everything else
        let listener = match lookup("FUNCTIONS_CUSTOMHANDLER_PORT") {
            Some(port) => SocketAddrV4::new(
                Ipv4Addr::new(127, 0, 0, 1),
                parse_var("FUNCTIONS_CUSTOMHANDLER_PORT", port, "Must be a valid port number, e.g. 7071")?,
            ),
            None => match lookup("RELAY_LISTENER") {
                Some(v) => parse_listener(v)?,
                None => DEFAULT_LISTENER,
            },
        };

        let vehicle_api_base = lookup("VEHICLE_API_BASE").unwrap_or_else(|| DEFAULT_VEHICLE_API_BASE.to_string());
        let telegram_api_base =
            lookup("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());

        let defaults = WakeSettings::default();
        let wake = WakeSettings {
            poll_interval: secs_var(&lookup, "WAKE_POLL_INTERVAL_SECS", defaults.poll_interval)?,
            timeout: secs_var(&lookup, "WAKE_TIMEOUT_SECS", defaults.timeout)?,
            settle: secs_var(&lookup, "WAKE_SETTLE_SECS", defaults.settle)?,
        };
        if wake.poll_interval.is_zero() {
            return Err(ConfigError::InvalidVar {
                name: "WAKE_POLL_INTERVAL_SECS",
                value: "0".to_string(),
                hint: "Must be greater than 0",
            });
        }

        let upstream_timeout = secs_var(&lookup, "UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT)?;

        let notify_path = PathBuf::from(lookup("RELAY_NOTIFY_CONFIG").unwrap_or_else(|| DEFAULT_NOTIFY_CONFIG.to_string()));
        let notify = NotifyConfig::load(&notify_path)?;

        info!(
            "Vehicle API: {}\n- wake-up: every {}s for up to {}s, settle {}s\n- notifications: {}",
            vehicle_api_base,
            wake.poll_interval.as_secs(),
            wake.timeout.as_secs(),
            wake.settle.as_secs(),
            if notify.is_some() { "on" } else { "off" },
        );

        Ok(Self {
            listener,
            vehicle_api_base,
            telegram_api_base,
            notify,
            wake,
            upstream_timeout,
        })
    }
}

/// Parses `IP:port`, e.g. `0.0.0.0:8080`
fn parse_listener(value: String) -> Result<SocketAddrV4, ConfigError> {
    match value.split_once(':') {
        Some((ip, port)) => {
            let ip: Ipv4Addr = parse_var("RELAY_LISTENER", ip.to_string(), "Must be a valid IP4, e.g. 127.0.0.1:7071")?;
            let port: u16 = parse_var("RELAY_LISTENER", port.to_string(), "Must be a valid port, e.g. 127.0.0.1:7071")?;
            Ok(SocketAddrV4::new(ip, port))
        }
        None => Err(ConfigError::InvalidVar {
            name: "RELAY_LISTENER",
            value,
            hint: "Must be IP:port, e.g. 127.0.0.1:7071",
        }),
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: String, hint: &'static str) -> Result<T, ConfigError> {
    match value.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(ConfigError::InvalidVar { name, value, hint }),
    }
}

fn secs_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(name) {
        Some(v) => Ok(Duration::from_secs(parse_var(name, v, "Must be a whole number of seconds")?)),
        None => Ok(default),
    }
}
