//! TORUM Rust Client Library
//!
//! A Rust client for the TORUM trading-community forum API: accounts,
//! discussion posts, reference documents and search, on top of a session
//! core that persists credentials, renews expired access tokens before
//! they are sent, and gates views by role.

pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod guard;
pub mod posts;
pub mod search;
pub mod users;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{
    MemoryStorage, SessionManager, SessionStorage, SignUpCredentials, TokenResponse, TokenStore,
    User,
};
use crate::config::ClientOptions;
use crate::documents::DocumentsClient;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::gateway::RequestGateway;
use crate::guard::{LogNavigator, Navigator, RouteGuard, RoutePolicy};
use crate::posts::PostsClient;
use crate::search::SearchClient;
use crate::users::UsersClient;

/// The main entry point for the TORUM client
pub struct Torum {
    options: ClientOptions,
    http_client: Client,
    session: Arc<SessionManager>,
    gateway: RequestGateway,
    guard: RouteGuard,
}

impl Torum {
    /// Create a client that keeps its session in memory
    ///
    /// # Example
    ///
    /// ```
    /// use torum_client::{Torum, config::ClientOptions};
    ///
    /// let torum = Torum::new(ClientOptions::default()).unwrap();
    /// assert!(torum.current_user().is_none());
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::with_storage(options, Arc::new(MemoryStorage::new()), Arc::new(LogNavigator))
    }

    /// Create a client persisting its session in `storage` and moving
    /// between views through `navigator`
    ///
    /// A session already present in `storage` is restored.
    pub fn with_storage(
        options: ClientOptions,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let store = TokenStore::new(storage, options.storage_keys.clone());
        let session = Arc::new(SessionManager::new(
            http_client.clone(),
            options.clone(),
            store,
        ));
        let gateway = RequestGateway::new(
            http_client.clone(),
            options.clone(),
            session.clone(),
            navigator.clone(),
        );
        let guard = RouteGuard::new(session.clone(), RoutePolicy::forum(), navigator, &options);

        Ok(Self {
            options,
            http_client,
            session,
            gateway,
            guard,
        })
    }

    /// Replace the route policy used by the guard
    pub fn with_route_policy(mut self, policy: RoutePolicy) -> Self {
        self.guard = RouteGuard::new(
            self.session.clone(),
            policy,
            self.guard_navigator(),
            &self.options,
        );
        self
    }

    fn guard_navigator(&self) -> Arc<dyn Navigator> {
        self.gateway.navigator()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The shared session manager
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    /// Last session error, for display
    pub fn error(&self) -> Option<String> {
        self.session.error()
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn users(&self) -> UsersClient<'_> {
        UsersClient::new(&self.gateway)
    }

    pub fn posts(&self) -> PostsClient<'_> {
        PostsClient::new(&self.gateway)
    }

    pub fn documents(&self) -> DocumentsClient<'_> {
        DocumentsClient::new(&self.gateway)
    }

    pub fn search(&self) -> SearchClient<'_> {
        SearchClient::new(&self.gateway)
    }

    /// Register a new account
    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<User> {
        let url = self.options.endpoint("/register");
        Fetch::post(&self.http_client, &url)
            .json(credentials)?
            .execute::<User>()
            .await
    }

    /// Log in with email and password
    ///
    /// The session is only installed once both the token exchange and the
    /// lookup of the account behind the new token have succeeded.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let url = self.options.endpoint("/login");
        let tokens = Fetch::post(&self.http_client, &url)
            .form(&[("username", email), ("password", password)])
            .execute::<TokenResponse>()
            .await?;

        let url = self.options.endpoint("/me");
        let user = Fetch::get(&self.http_client, &url)
            .bearer_auth(&tokens.access_token)
            .execute::<User>()
            .await?;

        self.session
            .login(&tokens.access_token, &tokens.refresh_token, user.clone());
        Ok(user)
    }

    /// Register, then log in with the same credentials
    pub async fn sign_up_and_login(&self, credentials: &SignUpCredentials) -> Result<User> {
        self.sign_up(credentials).await?;
        self.sign_in(&credentials.email, &credentials.password)
            .await
    }

    /// Log out; always ends the local session
    pub async fn sign_out(&self) {
        self.session.logout().await;
    }

    /// Re-read the current account so role changes apply at the next
    /// navigation
    pub async fn reload_user(&self) -> Result<User> {
        let user = self.users().me().await?;
        self.session.update_user(user.clone())?;
        Ok(user)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Role, SessionManager, SessionStatus, User};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::guard::{Navigator, RouteDecision, RoutePolicy};
    pub use crate::Torum;
}
