//! Client configuration.
//!
//! Durations are written as whole seconds when (de)serialized, so a config
//! file reads `timeout = 30` rather than a `{secs, nanos}` map.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ApiUrl;

/// Default refresh endpoint path.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Default authorization scheme.
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";

/// Behaviour of the token-refresh coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path of the refresh endpoint, relative to the API base URL.
    pub refresh_path: String,

    /// Scheme written before the access token in the `Authorization` header.
    pub auth_scheme: String,

    /// Upper bound on the refresh call. `None` waits as long as the transport
    /// does.
    #[serde(with = "duration_secs::option")]
    pub refresh_timeout: Option<Duration>,

    /// How many refresh coordinations one original call may take part in.
    pub max_refresh_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            refresh_timeout: None,
            max_refresh_attempts: 1,
        }
    }
}

impl ClientConfig {
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    pub fn with_max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.max_refresh_attempts = attempts;
        self
    }

    /// Authorization header value for an access token.
    pub fn authorization_value(&self, access_token: &str) -> String {
        format!("{} {}", self.auth_scheme, access_token)
    }

    /// Strip the scheme prefix from an authorization header value.
    ///
    /// Returns `None` for an empty token or a value using another scheme.
    pub fn strip_scheme<'a>(&self, header_value: &'a str) -> Option<&'a str> {
        let token = header_value
            .strip_prefix(self.auth_scheme.as_str())?
            .strip_prefix(' ')?
            .trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Settings for an HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// API base URL every request path is resolved against.
    pub base_url: ApiUrl,

    /// Per-request timeout.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("roomkey/", env!("CARGO_PKG_VERSION")).to_string()
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(duration) => serializer.serialize_some(&duration.as_secs()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
        }
    }
}
