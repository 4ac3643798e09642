//! Outbound API calls with automatic bearer credentials
//!
//! Before every send the stored access token is checked against its
//! embedded expiry and renewed when stale, so requests never carry a token
//! known to be expired.

use reqwest::{multipart, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::auth::{token, SessionManager};
use crate::config::ClientOptions;
use crate::error::Result;
use crate::fetch::{Fetch, FetchBuilder};
use crate::guard::Navigator;

/// Attaches and renews credentials for API calls
pub struct RequestGateway {
    client: Client,
    options: ClientOptions,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
}

impl RequestGateway {
    pub fn new(
        client: Client,
        options: ClientOptions,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            options,
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn navigator(&self) -> Arc<dyn Navigator> {
        self.navigator.clone()
    }

    /// The access token to attach to the next request
    ///
    /// Returns `None` when there is no session, or when a stale token could
    /// not be renewed. In the latter case the session has been torn down and
    /// the client sent to the login view.
    pub async fn bearer_token(&self) -> Option<String> {
        let access_token = self.session.access_token()?;

        if !token::needs_renewal(&access_token, token::now()) {
            return Some(access_token);
        }

        log::debug!("access token expired or unreadable, renewing before send");
        match self.session.renew(&access_token).await {
            Ok(renewed) => Some(renewed),
            Err(err) => {
                log::warn!("could not renew access token: {}", err);
                self.navigator.navigate(&self.options.login_route);
                None
            }
        }
    }

    /// Start a request to an API path
    pub fn request(&self, method: Method, path: &str) -> GatewayRequest<'_> {
        let url = self.options.endpoint(path);
        GatewayRequest {
            gateway: self,
            inner: Fetch::request(&self.client, method, &url),
        }
    }

    pub fn get(&self, path: &str) -> GatewayRequest<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> GatewayRequest<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> GatewayRequest<'_> {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> GatewayRequest<'_> {
        self.request(Method::DELETE, path)
    }
}

/// A request that picks up credentials when it is sent
pub struct GatewayRequest<'a> {
    gateway: &'a RequestGateway,
    inner: FetchBuilder<'a>,
}

impl<'a> GatewayRequest<'a> {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.inner = self.inner.query(key, value);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.inner = self.inner.json(body)?;
        Ok(self)
    }

    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.inner = self.inner.multipart(form);
        self
    }

    async fn authorized(self) -> FetchBuilder<'a> {
        match self.gateway.bearer_token().await {
            Some(token) => self.inner.bearer_auth(&token),
            None => self.inner,
        }
    }

    /// Send and decode the JSON response
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        self.authorized().await.execute().await
    }

    /// Send, failing on a non-success status
    pub async fn execute_empty(self) -> Result<()> {
        self.authorized().await.execute_empty().await
    }

    /// Send and hand back the response whatever its status
    pub async fn execute_raw(self) -> Result<Response> {
        self.authorized().await.execute_raw().await
    }
}
