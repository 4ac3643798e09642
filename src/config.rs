//! Configuration options for the TORUM client

use std::env;
use std::time::Duration;

/// Default address of the TORUM API server
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Names under which the session is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Key holding the access token
    pub access_token: String,

    /// Key holding the refresh token
    pub refresh_token: String,

    /// Key holding the serialized user record
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: "access_token".to_string(),
            refresh_token: "refresh_token".to_string(),
            user: "user".to_string(),
        }
    }
}

/// Configuration options for the TORUM client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the API server
    pub base_url: String,

    /// The request timeout; `None` leaves the transport default
    pub request_timeout: Option<Duration>,

    /// Route the client is sent to when it has no usable session
    pub login_route: String,

    /// Route the client is sent to when its role is not permitted
    pub unauthorized_route: String,

    /// Persisted session key names
    pub storage_keys: StorageKeys,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            login_route: "/login".to_string(),
            unauthorized_route: "/unauthorized".to_string(),
            storage_keys: StorageKeys::default(),
        }
    }
}

impl ClientOptions {
    /// Build options from `TORUM_API_URL` and `TORUM_REQUEST_TIMEOUT_SECS`,
    /// keeping defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(url) = env::var("TORUM_API_URL") {
            if !url.trim().is_empty() {
                options.base_url = url;
            }
        }

        if let Ok(secs) = env::var("TORUM_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => options.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => log::warn!("ignoring invalid TORUM_REQUEST_TIMEOUT_SECS={}", secs),
            }
        }

        options
    }

    /// Set the base URL
    pub fn with_base_url(mut self, value: &str) -> Self {
        self.base_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the login route
    pub fn with_login_route(mut self, value: &str) -> Self {
        self.login_route = value.to_string();
        self
    }

    /// Set the unauthorized route
    pub fn with_unauthorized_route(mut self, value: &str) -> Self {
        self.unauthorized_route = value.to_string();
        self
    }

    /// Set the persisted key names
    pub fn with_storage_keys(mut self, value: StorageKeys) -> Self {
        self.storage_keys = value;
        self
    }

    /// Full URL for an API path
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
