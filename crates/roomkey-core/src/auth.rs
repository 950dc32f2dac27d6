//! Auth endpoints of the booking API.
//!
//! Login and registration bypass refresh coordination: a `401` there means
//! the credentials are wrong, not that a token expired.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::client::ApiSdk;
use crate::error::{AuthError, Error};
use crate::tokens::TokenPair;
use crate::transport::{ApiRequest, Transport};

/// POST, returns a token pair.
pub const LOGIN: &str = "/auth/login";

/// POST, may return a token pair.
pub const REGISTER: &str = "/auth/register";

/// GET, profile of the signed-in user.
pub const PROFILE: &str = "/auth/me";

/// POST, invalidates the refresh token server side.
pub const LOGOUT: &str = "/auth/logout";

/// Login credentials.
///
/// # Security
///
/// The password is never exposed in Debug output.
#[derive(Clone, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sign-up details.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

impl Registration {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

impl<T: Transport> ApiSdk<T> {
    /// Log in and install the returned tokens.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] when the server answers `401`.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        info!("Logging in");

        let body = serde_json::to_value(&credentials).map_err(|e| {
            Error::from(crate::error::InvalidInputError::Other {
                message: e.to_string(),
            })
        })?;

        let response = self
            .send_direct(ApiRequest::post(LOGIN).with_body(body))
            .await
            .map_err(reject_credentials)?;

        let (access, refresh) = response.json::<TokenPair>()?.into_tokens();
        self.set_tokens(access, refresh)?;

        debug!("Logged in");
        Ok(())
    }

    /// Create an account. Tokens in the response, if any, are installed.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<Value> {
        info!("Registering account");

        let body = serde_json::to_value(&registration).map_err(|e| {
            Error::from(crate::error::InvalidInputError::Other {
                message: e.to_string(),
            })
        })?;

        let response = self
            .send_direct(ApiRequest::post(REGISTER).with_body(body))
            .await?;

        if let Ok(pair) = serde_json::from_value::<TokenPair>(response.body.clone()) {
            let (access, refresh) = pair.into_tokens();
            self.set_tokens(access, refresh)?;
            debug!("Registration returned a session");
        }

        Ok(response.body)
    }

    /// Profile of the signed-in user.
    pub async fn profile(&self) -> Result<Value> {
        if !self.is_authenticated() && self.refresh_token().is_none() {
            return Err(AuthError::NotAuthenticated.into());
        }
        Ok(self.get(PROFILE).await?.body)
    }

    /// End the session.
    ///
    /// The server call is best effort; local tokens are always cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(refresh) = self.refresh_token() {
            let request = ApiRequest::post(LOGOUT)
                .with_body(serde_json::json!({ "refreshToken": refresh.as_str() }));
            if let Err(e) = self.send_direct(request).await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }

        self.clear_tokens();
        info!("Logged out");
    }
}

fn reject_credentials(err: Error) -> Error {
    if err.is_unauthorized() {
        AuthError::InvalidCredentials.into()
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_hides_password_in_debug() {
        let creds = Credentials::new("guest@example.com", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("guest@example.com"));
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn registration_serializes_camel_case() {
        let registration = Registration::new("a@b.c", "pw", "Ada", "Lovelace");
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["lastName"], "Lovelace");
        assert!(!format!("{:?}", registration).contains("\"pw\""));
    }
}
