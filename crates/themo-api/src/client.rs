// Themo cloud HTTP client
//
// Wraps `reqwest::Client` with Themo-specific URL construction, bearer-token
// injection, and status-to-error mapping. Authentication lives in `auth.rs`
// as inherent methods to keep this module focused on transport mechanics.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::device::Device;
use crate::error::Error;
use crate::models::{ClientInfo, DevicePayload, Environment, Schedule};
use crate::transport::TransportConfig;

/// Production Themo cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://app.themo.io/";

/// API version sent as a query parameter on every request.
const API_VERSION: &str = "1.0";

/// Client for the Themo cloud API. One instance per session.
///
/// Call [`authenticate`](Self::authenticate) first; the bearer token it
/// obtains is attached to every subsequent request. Each method is a single
/// best-effort HTTP round trip — nothing is retried internally, and the
/// outcome is surfaced verbatim as [`Error`].
pub struct ThemoClient {
    http: reqwest::Client,
    base_url: Url,
    /// Bearer token captured from the login response.
    token: RwLock<Option<SecretString>>,
    /// Set by `close()`; a closed session rejects all further requests.
    closed: AtomicBool,
}

impl ThemoClient {
    /// Create a client for the given API root from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client for the production cloud with default transport.
    pub fn production() -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        Self::new(base_url, &TransportConfig::default())
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Close the session.
    ///
    /// Drops the bearer token and rejects every later call with
    /// [`Error::SessionClosed`]. Pooled connections are released when the
    /// client itself is dropped.
    pub fn close(&self) {
        debug!("closing session");
        self.closed.store(true, Ordering::SeqCst);
        *self.token.write().expect("token lock poisoned") = None;
    }

    // ── Token management ─────────────────────────────────────────────

    /// Store the bearer token (captured from the login response).
    pub(crate) fn set_token(&self, token: SecretString) {
        debug!("storing bearer token");
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    /// Apply the stored bearer token to a request builder.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().expect("token lock poisoned");
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL / request plumbing ───────────────────────────────────────

    /// Build a full URL for an API path, e.g. `api/environments`.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    /// Send a GET request and decode the JSON body.
    ///
    /// `query` is appended after the mandatory `api-version` parameter.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        self.ensure_open()?;
        let url = self.url(path)?;
        debug!("GET {}", url);

        let resp = self
            .authorize(self.http.get(url))
            .query(&[("api-version", API_VERSION)])
            .query(query)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.ensure_open()?;
        let url = self.url(path)?;
        debug!("POST {}", url);

        let resp = self
            .authorize(self.http.post(url))
            .query(&[("api-version", API_VERSION)])
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send a POST request with a JSON body, checking status only.
    ///
    /// Command endpoints return nothing useful; success is the status code.
    pub(crate) async fn post_no_content(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        self.ensure_open()?;
        let url = self.url(path)?;
        debug!("POST {}", url);

        let resp = self
            .authorize(self.http.post(url))
            .query(&[("api-version", API_VERSION)])
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::check_status(resp).await.map(|_| ())
    }

    /// Send a PUT request with a JSON body, checking status only.
    pub(crate) async fn put_no_content(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        self.ensure_open()?;
        let url = self.url(path)?;
        debug!("PUT {}", url);

        let resp = self
            .authorize(self.http.put(url))
            .query(&[("api-version", API_VERSION)])
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::check_status(resp).await.map(|_| ())
    }

    /// Map a non-success status to an error, returning the response
    /// untouched otherwise.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token expired or invalid credentials".into(),
            });
        }

        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    /// Check the status, then decode the body as JSON.
    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    // ── Session endpoints ────────────────────────────────────────────

    /// Fetch the client record the vendor derives for this session.
    ///
    /// `GET api/clients/me`
    pub async fn client_info(&self) -> Result<ClientInfo, Error> {
        self.get("api/clients/me", &[]).await
    }

    /// List the environments visible to the authenticated account.
    ///
    /// `GET api/environments`
    pub async fn environments(&self) -> Result<Vec<Environment>, Error> {
        self.get("api/environments", &[]).await
    }

    // ── Device discovery ─────────────────────────────────────────────

    /// List all devices across all environments, with live state.
    ///
    /// `GET api/environments/{env}/devices?state=true` per environment.
    pub async fn devices(&self) -> Result<Vec<Device>, Error> {
        let environments = self.environments().await?;

        let mut devices = Vec::new();
        for env in &environments {
            let env_id = env.id.to_string();
            let payloads: Vec<DevicePayload> = self
                .get(
                    &format!("api/environments/{env_id}/devices"),
                    &[("state", "true")],
                )
                .await?;
            devices.extend(
                payloads
                    .into_iter()
                    .map(|payload| Device::from_payload(&env_id, payload)),
            );
        }

        Ok(devices)
    }

    /// Get a single device by environment and device id, fully refreshed
    /// (state and schedules).
    pub async fn get_device(&self, environment_id: &str, device_id: &str) -> Result<Device, Error> {
        let mut device = Device::new(device_id, environment_id);
        device.refresh(self).await?;
        Ok(device)
    }

    // ── Raw device endpoints (used by `Device`) ──────────────────────

    /// Fetch a device payload with live state.
    ///
    /// `GET api/environments/{env}/devices/{id}?state=true`
    pub async fn device_data(
        &self,
        environment_id: &str,
        device_id: &str,
    ) -> Result<DevicePayload, Error> {
        self.get(
            &format!("api/environments/{environment_id}/devices/{device_id}"),
            &[("state", "true")],
        )
        .await
    }

    /// Fetch the schedules defined on a device.
    ///
    /// `GET api/environments/{env}/devices/{id}/schedules`
    pub async fn device_schedules(
        &self,
        environment_id: &str,
        device_id: &str,
    ) -> Result<Vec<Schedule>, Error> {
        self.get(
            &format!("api/environments/{environment_id}/devices/{device_id}/schedules"),
            &[],
        )
        .await
    }

    /// Send a control command to a device.
    ///
    /// `POST api/environments/{env}/devices/{id}/commands/message`
    pub async fn send_command(
        &self,
        environment_id: &str,
        device_id: &str,
        body: &serde_json::Value,
    ) -> Result<(), Error> {
        debug!(environment_id, device_id, "sending device command");
        self.post_no_content(
            &format!("api/environments/{environment_id}/devices/{device_id}/commands/message"),
            body,
        )
        .await
    }

    /// Mark a schedule active.
    ///
    /// `PUT api/environments/{env}/devices/{id}/schedules/{schedule_id}`
    pub async fn update_schedule(
        &self,
        environment_id: &str,
        device_id: &str,
        schedule_id: i64,
        name: &str,
    ) -> Result<(), Error> {
        debug!(environment_id, device_id, schedule_id, "activating schedule");
        self.put_no_content(
            &format!(
                "api/environments/{environment_id}/devices/{device_id}/schedules/{schedule_id}"
            ),
            &serde_json::json!({
                "Name": name,
                "Active": true,
            }),
        )
        .await
    }
}
