// Themo cloud authentication
//
// Username/password login against `api/auth/login`. The returned token is
// stored on the client and sent as a bearer header on every later request.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ThemoClient;
use crate::error::Error;
use crate::models::LoginResponse;

impl ThemoClient {
    /// Authenticate with the Themo cloud using username/password.
    ///
    /// `POST api/auth/login` with `{"Username", "Password"}`. On success
    /// the returned `Token` is stored and attached to all subsequent
    /// requests. Bad credentials, a rejected login, or a login response
    /// without a token all surface as [`Error::Authentication`].
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        debug!(username, "logging in");

        let body = json!({
            "Username": username,
            "Password": password.expose_secret(),
        });

        let login: LoginResponse = match self.post("api/auth/login", &body).await {
            Ok(login) => login,
            Err(Error::Api { status, message }) => {
                return Err(Error::Authentication {
                    message: format!("login failed (HTTP {status}): {message}"),
                });
            }
            Err(e) => return Err(e),
        };

        let Some(token) = login.token else {
            return Err(Error::Authentication {
                message: "no token in login response".into(),
            });
        };

        self.set_token(SecretString::from(token));
        debug!("login successful");
        Ok(())
    }
}
