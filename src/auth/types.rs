//! Types for authentication and user management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Account role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(Error::validation(format!("unknown role: {}", other))),
        }
    }
}

/// User record as returned by `/me` and `/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub user_id: String,

    /// Display name
    pub username: String,

    /// Email address, also the login name
    pub email: String,

    /// The user's role; records without one get the least privileged role
    #[serde(default)]
    pub user_role: Role,
}

/// Authenticated client-side state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The logged-in user
    pub user: User,

    /// Short-lived bearer credential
    pub access_token: String,

    /// Credential used to obtain a new access token
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: String, refresh_token: String, user: User) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
        }
    }

    pub fn role(&self) -> Role {
        self.user.user_role
    }
}

/// Response of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Response of `POST /refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body of `POST /refresh` and `POST /logout`
#[derive(Debug, Serialize)]
pub(crate) struct RefreshTokenBody<'a> {
    pub refresh_token: &'a str,
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct SignUpCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpCredentials {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}
