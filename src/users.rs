//! Account and profile management

use serde::Serialize;

use crate::auth::{Role, User};
use crate::error::{Error, Result};
use crate::gateway::RequestGateway;

/// Changes to the caller's own account
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Client for the account endpoints
pub struct UsersClient<'a> {
    gateway: &'a RequestGateway,
}

impl<'a> UsersClient<'a> {
    pub(crate) fn new(gateway: &'a RequestGateway) -> Self {
        Self { gateway }
    }

    /// Refuse locally when the current user lacks every role in `roles`
    ///
    /// The server remains the authority; this only avoids requests that are
    /// bound to be rejected.
    fn require_role(&self, roles: &[Role]) -> Result<()> {
        let user = self
            .gateway
            .session()
            .current_user()
            .ok_or(Error::NotAuthenticated)?;
        if roles.contains(&user.user_role) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "role {} may not perform this action",
                user.user_role
            )))
        }
    }

    /// The account behind the current credentials
    pub async fn me(&self) -> Result<User> {
        self.gateway.get("/me").execute::<User>().await
    }

    /// Every account; admin only
    pub async fn list(&self) -> Result<Vec<User>> {
        self.require_role(&[Role::Admin])?;
        self.gateway.get("/users").execute::<Vec<User>>().await
    }

    /// Change the caller's username and/or password
    pub async fn update(&self, update: &UserUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::validation("No changes to update"));
        }
        self.gateway
            .put("/update-user")
            .json(update)?
            .execute_empty()
            .await
    }

    /// Change another account's role; admin only
    pub async fn update_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.require_role(&[Role::Admin])?;
        self.gateway
            .put(&format!("/update-user-role/{}", user_id))
            .query("new_role", role.as_str())
            .execute_empty()
            .await
    }
}
