//! The static command table.
//!
//! Each logical command the callers know about maps onto one vendor endpoint and one body shape.
//! Several logical commands share an endpoint and only differ in the body they send,
//! e.g. `actuate_trunk` and `actuate_frunk` both call `actuate_trunk`.

use crate::error::RelayError;
use crate::request::{CommandRequest, Setting};
use serde_json::{json, Map, Value};

/// The vendor endpoint name that does not live under `/command/`.
pub const WAKE_UP: &str = "wake_up";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trunk {
    Front,
    Rear,
}

impl Trunk {
    fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Rear => "rear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Close,
    Vent,
}

impl WindowMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Vent => "vent",
        }
    }
}

/// The JSON body a command sends to the vendor API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// `{}`
    Empty,
    /// `{"which_trunk": "front" | "rear"}`
    Trunk(Trunk),
    /// `{"on": true | false}`
    Toggle(bool),
    /// `{"command": "close" | "vent", "lat": 0, "lon": 0}`
    Windows(WindowMode),
    /// `{"driver_temp": VEHICLE_TEMP}`
    DriverTemp,
    /// `{"percent": VEHICLE_CHARGE_LIMIT}`
    ChargeLimit,
}

/// Where a command is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/vehicles/{id}/wake_up`
    WakeUp,
    /// `/vehicles/{id}/command/{name}`
    Command(&'static str),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Command {
    /// Logical name as sent in INPUT_CMD
    pub name: &'static str,
    /// Vendor endpoint name
    pub vendor: &'static str,
    pub body: BodyShape,
}

const fn cmd(name: &'static str, vendor: &'static str, body: BodyShape) -> Command {
    Command { name, vendor, body }
}

pub const COMMANDS: &[Command] = &[
    cmd("wake_up", WAKE_UP, BodyShape::Empty),
    cmd("stop_hvac", "auto_conditioning_stop", BodyShape::Empty),
    cmd("start_hvac", "auto_conditioning_start", BodyShape::Empty),
    cmd("start_hvac_max", "set_preconditioning_max", BodyShape::Empty),
    cmd("set_temps", "set_temps", BodyShape::DriverTemp),
    cmd("honk_horn", "honk_horn", BodyShape::Empty),
    cmd("flash_lights", "flash_lights", BodyShape::Empty),
    cmd("actuate_trunk", "actuate_trunk", BodyShape::Trunk(Trunk::Rear)),
    cmd("actuate_frunk", "actuate_trunk", BodyShape::Trunk(Trunk::Front)),
    cmd("start_remote_drive", "remote_start_drive", BodyShape::Empty),
    cmd("start_sentry", "set_sentry_mode", BodyShape::Toggle(true)),
    cmd("stop_sentry", "set_sentry_mode", BodyShape::Toggle(false)),
    cmd("start_valet_mode", "set_valet_mode", BodyShape::Toggle(true)),
    cmd("stop_valet_mode", "set_valet_mode", BodyShape::Toggle(false)),
    cmd("unlock_doors", "door_unlock", BodyShape::Empty),
    cmd("lock_doors", "door_lock", BodyShape::Empty),
    cmd("open_charge_port_door", "charge_port_door_open", BodyShape::Empty),
    cmd("close_charge_port_door", "charge_port_door_close", BodyShape::Empty),
    cmd("start_charging", "charge_start", BodyShape::Empty),
    cmd("stop_charging", "charge_stop", BodyShape::Empty),
    cmd("set_charge_limit", "set_charge_limit", BodyShape::ChargeLimit),
    cmd("charge_standard", "charge_standard", BodyShape::Empty),
    cmd("charge_max_range", "charge_max_range", BodyShape::Empty),
    cmd("close_windows", "window_control", BodyShape::Windows(WindowMode::Close)),
    cmd("vent_windows", "window_control", BodyShape::Windows(WindowMode::Vent)),
];

/// Returns the table entry for a logical command name, if there is one.
pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

impl Command {
    pub fn endpoint(&self) -> Endpoint {
        if self.vendor == WAKE_UP {
            Endpoint::WakeUp
        } else {
            Endpoint::Command(self.vendor)
        }
    }

    /// Builds the outbound JSON body for this command.
    /// Fails only if the command copies a request field the caller did not send.
    pub fn build_body(&self, request: &CommandRequest) -> Result<Value, RelayError> {
        let body = match self.body {
            BodyShape::Empty => Value::Object(Map::new()),
            BodyShape::Trunk(trunk) => json!({ "which_trunk": trunk.as_str() }),
            BodyShape::Toggle(on) => json!({ "on": on }),
            BodyShape::Windows(mode) => json!({ "command": mode.as_str(), "lat": 0, "lon": 0 }),
            BodyShape::DriverTemp => json!({ "driver_temp": self.required(&request.vehicle_temp, "VEHICLE_TEMP")? }),
            BodyShape::ChargeLimit => {
                json!({ "percent": self.required(&request.vehicle_charge_limit, "VEHICLE_CHARGE_LIMIT")? })
            }
        };

        Ok(body)
    }

    fn required<'a>(&self, value: &'a Option<Setting>, field: &str) -> Result<&'a Setting, RelayError> {
        value
            .as_ref()
            .ok_or_else(|| RelayError::Validation(format!("{field} is required for {}", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn request(cmd: &str) -> CommandRequest {
        CommandRequest::from_slice(
            format!(r#"{{"TOKEN":"t","VEHICLE_ID":"1","INPUT_CMD":"{cmd}","VEHICLE_TEMP":"21.5","VEHICLE_CHARGE_LIMIT":80}}"#)
                .as_bytes(),
        )
        .unwrap()
    }

    fn body_of(cmd: &str) -> Value {
        lookup(cmd).unwrap().build_body(&request(cmd)).unwrap()
    }

    #[test]
    fn logical_names_are_unique() {
        let names: HashSet<_> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), COMMANDS.len());
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert_eq!(lookup("self_destruct"), None);
        assert_eq!(lookup("HONK_HORN"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn trunk_discriminator_is_front_or_rear() {
        let frunk = lookup("actuate_frunk").unwrap();
        let trunk = lookup("actuate_trunk").unwrap();
        assert_eq!(frunk.vendor, trunk.vendor);
        assert_eq!(body_of("actuate_frunk"), json!({"which_trunk": "front"}));
        assert_eq!(body_of("actuate_trunk"), json!({"which_trunk": "rear"}));
    }

    #[test]
    fn toggles_send_on_flag() {
        assert_eq!(body_of("start_sentry"), json!({"on": true}));
        assert_eq!(body_of("stop_sentry"), json!({"on": false}));
        assert_eq!(body_of("start_valet_mode"), json!({"on": true}));
        assert_eq!(body_of("stop_valet_mode"), json!({"on": false}));
    }

    #[test]
    fn windows_send_mode_and_zero_coordinates() {
        assert_eq!(body_of("close_windows"), json!({"command": "close", "lat": 0, "lon": 0}));
        assert_eq!(body_of("vent_windows"), json!({"command": "vent", "lat": 0, "lon": 0}));
    }

    #[test]
    fn caller_values_are_copied_verbatim() {
        assert_eq!(body_of("set_temps"), json!({"driver_temp": "21.5"}));
        assert_eq!(body_of("set_charge_limit"), json!({"percent": 80}));
    }

    #[test]
    fn missing_caller_value_is_a_validation_error() {
        let req = CommandRequest::from_slice(br#"{"TOKEN":"t","VEHICLE_ID":"1","INPUT_CMD":"set_temps"}"#).unwrap();
        let err = lookup("set_temps").unwrap().build_body(&req).unwrap_err();
        assert_eq!(err.to_string(), "Validation error VEHICLE_TEMP is required for set_temps");
    }

    #[test]
    fn other_commands_send_empty_body() {
        for name in ["honk_horn", "flash_lights", "wake_up", "charge_max_range", "lock_doors"] {
            assert_eq!(body_of(name), json!({}), "{name}");
        }
    }

    #[test]
    fn wake_up_has_its_own_endpoint() {
        assert_eq!(lookup("wake_up").unwrap().endpoint(), Endpoint::WakeUp);
        assert_eq!(
            lookup("unlock_doors").unwrap().endpoint(),
            Endpoint::Command("door_unlock")
        );
    }
}
