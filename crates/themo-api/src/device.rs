// Themo device wrapper
//
// Attribute container for one thermostat plus the setters that drive it.
// Attributes mirror only the last successfully fetched or set state; the
// library does not reconcile with changes made elsewhere (wall panel,
// vendor app). Each setter sends its payload, errors on a non-success
// status, and updates the local attribute only on success.

use serde_json::json;
use tracing::debug;

use crate::client::ThemoClient;
use crate::error::Error;
use crate::models::{DevicePayload, Mode, Schedule};

/// A Themo thermostat and its last known state.
///
/// Obtained from [`ThemoClient::devices`] or [`ThemoClient::get_device`].
/// All methods borrow the session client; the device itself holds no
/// connection.
#[derive(Debug, Clone, Default)]
pub struct Device {
    /// Vendor device id, used in endpoint paths.
    pub id: String,
    /// Environment the device belongs to.
    pub environment_id: String,

    pub name: Option<String>,
    /// Hardware serial (the vendor's `DeviceId`).
    pub serial: Option<String>,

    pub active_schedule: Option<String>,
    pub available_schedules: Vec<String>,

    pub floor_temperature: Option<f64>,
    pub info: Option<String>,
    pub lights: Option<bool>,
    pub manual_temperature: Option<f64>,
    pub max_power: Option<f64>,
    pub mode: Option<Mode>,
    pub power: Option<f64>,
    pub room_temperature: Option<f64>,
    pub sw_version: Option<String>,
}

impl Device {
    /// Create an empty device shell; call [`refresh`](Self::refresh) to
    /// populate it.
    pub fn new(id: &str, environment_id: &str) -> Self {
        Self {
            id: id.to_owned(),
            environment_id: environment_id.to_owned(),
            ..Self::default()
        }
    }

    /// Build a device from a listing payload (already carries state).
    pub(crate) fn from_payload(environment_id: &str, payload: DevicePayload) -> Self {
        let mut device = Self::new(&payload.id.to_string(), environment_id);
        device.apply_payload(payload);
        device
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Refresh everything: live state, then schedules.
    pub async fn refresh(&mut self, client: &ThemoClient) -> Result<(), Error> {
        self.fetch_state(client).await?;
        self.fetch_schedules(client).await
    }

    /// Fetch the current device state only.
    pub async fn fetch_state(&mut self, client: &ThemoClient) -> Result<(), Error> {
        let payload = client.device_data(&self.environment_id, &self.id).await?;
        self.apply_payload(payload);
        Ok(())
    }

    /// Fetch the device schedules only.
    pub async fn fetch_schedules(&mut self, client: &ThemoClient) -> Result<(), Error> {
        let schedules = client
            .device_schedules(&self.environment_id, &self.id)
            .await?;
        self.apply_schedules(&schedules);
        Ok(())
    }

    fn apply_payload(&mut self, payload: DevicePayload) {
        self.name = payload.name;
        self.serial = payload.serial;

        let state = payload.state.unwrap_or_default();
        self.floor_temperature = state.floor_temperature;
        self.info = state.info;
        self.lights = state.lights;
        self.manual_temperature = state.manual_temperature;
        self.max_power = state.max_power;
        // Unrecognized mode strings from newer firmware degrade to None.
        self.mode = state.mode.and_then(|m| m.parse().ok());
        self.power = state.power;
        self.room_temperature = state.room_temperature;
        self.sw_version = state.sw_version;
    }

    fn apply_schedules(&mut self, schedules: &[Schedule]) {
        self.available_schedules = schedules.iter().map(|s| s.name.clone()).collect();
        self.active_schedule = schedules
            .iter()
            .find(|s| s.active)
            .map(|s| s.name.clone());
    }

    // ── Control commands ─────────────────────────────────────────────

    /// Switch the panel lights on or off.
    pub async fn set_lights(&mut self, client: &ThemoClient, on: bool) -> Result<(), Error> {
        debug!(device = %self.id, on, "setting lights");
        client
            .send_command(
                &self.environment_id,
                &self.id,
                &json!({ "CLights": i32::from(on) }),
            )
            .await?;
        self.lights = Some(on);
        Ok(())
    }

    /// Set the manual target temperature.
    pub async fn set_manual_temperature(
        &mut self,
        client: &ThemoClient,
        temperature: f64,
    ) -> Result<(), Error> {
        debug!(device = %self.id, temperature, "setting manual temperature");
        client
            .send_command(
                &self.environment_id,
                &self.id,
                &json!({ "CMT": temperature }),
            )
            .await?;
        self.manual_temperature = Some(temperature);
        Ok(())
    }

    /// Set the operating mode.
    pub async fn set_mode(&mut self, client: &ThemoClient, mode: Mode) -> Result<(), Error> {
        debug!(device = %self.id, %mode, "setting mode");
        client
            .send_command(
                &self.environment_id,
                &self.id,
                &json!({ "CMode": mode.as_str() }),
            )
            .await?;
        self.mode = Some(mode);
        Ok(())
    }

    /// Switch to a different schedule by name.
    ///
    /// The name must be one of [`available_schedules`](Self::available_schedules);
    /// the schedule id is resolved with a fresh fetch before activation.
    pub async fn set_active_schedule(
        &mut self,
        client: &ThemoClient,
        schedule_name: &str,
    ) -> Result<(), Error> {
        if !self.available_schedules.iter().any(|s| s == schedule_name) {
            return Err(Error::UnknownSchedule {
                name: schedule_name.to_owned(),
            });
        }

        // Re-fetch to resolve the id — names are stable, ids may not be.
        let schedules = client
            .device_schedules(&self.environment_id, &self.id)
            .await?;
        let Some(schedule) = schedules.iter().find(|s| s.name == schedule_name) else {
            return Err(Error::UnknownSchedule {
                name: schedule_name.to_owned(),
            });
        };

        debug!(device = %self.id, schedule = schedule_name, "activating schedule");
        client
            .update_schedule(
                &self.environment_id,
                &self.id,
                schedule.id,
                schedule_name,
            )
            .await?;

        self.active_schedule = Some(schedule_name.to_owned());
        Ok(())
    }
}
