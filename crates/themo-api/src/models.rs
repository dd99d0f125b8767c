// Themo cloud API response types.
//
// The vendor uses PascalCase JSON keys and abbreviated names for device
// state (`RT`, `MT`, `FloorT`, ...). Fields use `#[serde(default)]`
// liberally because the API is inconsistent about field presence, and each
// model keeps a catch-all `extra` map for undocumented fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ── Session ──────────────────────────────────────────────────────────

/// Body of `POST api/auth/login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default, rename = "Token")]
    pub token: Option<String>,
}

/// Client record from `GET api/clients/me` — the identifier the vendor
/// derives for the authenticated session.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default, rename = "Email")]
    pub email: Option<String>,
    #[serde(default, rename = "Name")]
    pub name: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Environment ──────────────────────────────────────────────────────

/// Environment (installation site) from `GET api/environments`.
///
/// Devices are scoped to an environment; listing devices walks every
/// environment the account can see.
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default, rename = "Name")]
    pub name: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Device payloads ──────────────────────────────────────────────────

/// Device object from the listing and detail endpoints.
///
/// With `?state=true` the payload carries a nested `State` object holding
/// the live thermostat readings.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicePayload {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default, rename = "Name")]
    pub name: Option<String>,
    /// Hardware serial (the vendor calls this `DeviceId`).
    #[serde(default, rename = "DeviceId")]
    pub serial: Option<String>,
    #[serde(default, rename = "State")]
    pub state: Option<DeviceState>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Live thermostat state nested inside a device payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceState {
    #[serde(default, rename = "FloorT")]
    pub floor_temperature: Option<f64>,
    #[serde(default, rename = "Info")]
    pub info: Option<String>,
    /// Reported as `0`/`1` by most firmware, `true`/`false` by some.
    #[serde(default, rename = "Lights", deserialize_with = "truthy")]
    pub lights: Option<bool>,
    #[serde(default, rename = "MT")]
    pub manual_temperature: Option<f64>,
    #[serde(default, rename = "MP")]
    pub max_power: Option<f64>,
    #[serde(default, rename = "Mode")]
    pub mode: Option<String>,
    #[serde(default, rename = "Power")]
    pub power: Option<f64>,
    #[serde(default, rename = "RT")]
    pub room_temperature: Option<f64>,
    #[serde(default, rename = "SW")]
    pub sw_version: Option<String>,
}

/// Coerce an integer or boolean flag into `Option<bool>`.
fn truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool().or_else(|| v.as_i64().map(|n| n != 0))))
}

// ── Schedules ────────────────────────────────────────────────────────

/// Schedule entry from `GET .../devices/{id}/schedules`.
#[derive(Debug, Clone, Deserialize)]
pub struct Schedule {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(default, rename = "Active")]
    pub active: bool,
}

// ── Operating mode ───────────────────────────────────────────────────

/// Thermostat operating mode.
///
/// The vendor accepts exactly these three values for the `CMode` command;
/// anything else is rejected server-side, so the variants are closed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Manual,
    Off,
    #[serde(rename = "SLS")]
    Sls,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Off => "Off",
            Self::Sls => "SLS",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Manual" => Ok(Self::Manual),
            "Off" => Ok(Self::Off),
            "SLS" => Ok(Self::Sls),
            _ => Err(()),
        }
    }
}
