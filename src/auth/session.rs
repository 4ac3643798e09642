//! Session lifecycle: login, logout and access-token renewal

use reqwest::Client;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

use crate::auth::store::TokenStore;
use crate::auth::token;
use crate::auth::types::{RefreshResponse, RefreshTokenBody, Session, User};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Error text set when renewal is attempted without a refresh token
pub const NO_REFRESH_TOKEN_MESSAGE: &str = "No refresh token available";

/// Error text set when renewal fails for any reason
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Coarse authentication state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    error: Option<String>,
}

/// Single owner of the authentication state
///
/// Shared as `Arc<SessionManager>`; every other component reads snapshots.
/// The in-memory session and the [`TokenStore`] are always written together.
pub struct SessionManager {
    client: Client,
    options: ClientOptions,
    store: TokenStore,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    /// Create a manager, restoring any session persisted in `store`
    pub fn new(client: Client, options: ClientOptions, store: TokenStore) -> Self {
        let session = store.load();
        match &session {
            Some(session) => log::debug!("restored session for {}", session.user.email),
            None if store.has_entries() => {
                log::warn!("discarding incomplete stored session");
                if let Err(err) = store.clear() {
                    log::warn!("failed to clear stored session: {}", err);
                }
            }
            None => {}
        }

        Self {
            client,
            options,
            store,
            state: RwLock::new(SessionState {
                session,
                error: None,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> SessionStatus {
        if self.read_state().session.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Snapshot of the logged-in user
    pub fn current_user(&self) -> Option<User> {
        self.read_state().session.as_ref().map(|s| s.user.clone())
    }

    /// Snapshot of the whole session
    pub fn session(&self) -> Option<Session> {
        self.read_state().session.clone()
    }

    /// Last user-facing error, cleared by the next successful operation
    pub fn error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_state()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_state()
            .session
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Enter the authenticated state
    ///
    /// Always succeeds locally; a persistence failure is logged and the
    /// session lives in memory only.
    pub fn login(&self, access_token: &str, refresh_token: &str, user: User) {
        let session = Session::new(access_token.to_string(), refresh_token.to_string(), user);
        if let Err(err) = self.store.save(&session) {
            log::warn!("failed to persist session: {}", err);
        }
        log::info!("logged in as {}", session.user.email);

        let mut state = self.write_state();
        state.session = Some(session);
        state.error = None;
    }

    /// Replace the stored user record, keeping both tokens
    pub fn update_user(&self, user: User) -> Result<()> {
        let mut state = self.write_state();
        let session = state.session.as_mut().ok_or(Error::NotAuthenticated)?;
        session.user = user;
        self.store.save(session)
    }

    /// End the session
    ///
    /// The server is told to invalidate the refresh token when one is held;
    /// any failure of that notification is logged and ignored. Local state
    /// and storage are cleared in every case.
    pub async fn logout(&self) {
        self.end_session().await;
        self.write_state().error = None;
    }

    async fn end_session(&self) {
        let tokens = self
            .read_state()
            .session
            .as_ref()
            .map(|s| (s.access_token.clone(), s.refresh_token.clone()));

        if let Some((access_token, refresh_token)) = tokens {
            let url = self.options.endpoint("/logout");
            let notified: Result<()> = async {
                Fetch::post(&self.client, &url)
                    .bearer_auth(&access_token)
                    .json(&RefreshTokenBody {
                        refresh_token: &refresh_token,
                    })?
                    .execute_empty()
                    .await
            }
            .await;

            if let Err(err) = notified {
                log::warn!("logout notification failed: {}", err);
            }
        }

        self.write_state().session = None;
        if let Err(err) = self.store.clear() {
            log::warn!("failed to clear stored session: {}", err);
        }
        log::info!("session ended");
    }

    fn fail(&self, message: &str) {
        self.write_state().error = Some(message.to_string());
    }

    /// Obtain a new access token with the held refresh token
    ///
    /// Only the access token is replaced. Without a refresh token, or on any
    /// failure of the renewal call, the session is ended and an error is set.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Renew an access token the caller found unusable
    ///
    /// Concurrent callers holding the same stale token share one renewal: a
    /// caller that waited for the lock returns the replacement when another
    /// flow has already installed it.
    pub(crate) async fn renew(&self, stale: &str) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        match self.access_token() {
            Some(current) if current != stale && !token::needs_renewal(&current, token::now()) => {
                log::debug!("access token already renewed");
                Ok(current)
            }
            Some(_) => self.refresh_locked().await,
            None => Err(Error::NotAuthenticated),
        }
    }

    async fn refresh_locked(&self) -> Result<String> {
        let refresh_token = match self.refresh_token().filter(|t| !t.is_empty()) {
            Some(refresh_token) => refresh_token,
            None => {
                log::warn!("cannot refresh without a refresh token");
                self.end_session().await;
                self.fail(NO_REFRESH_TOKEN_MESSAGE);
                return Err(Error::NotAuthenticated);
            }
        };

        let url = self.options.endpoint("/refresh");
        let result: Result<RefreshResponse> = async {
            Fetch::post(&self.client, &url)
                .json(&RefreshTokenBody {
                    refresh_token: &refresh_token,
                })?
                .execute::<RefreshResponse>()
                .await
        }
        .await;

        let result = result.and_then(|response| {
            if response.access_token.is_empty() {
                Err(Error::malformed("refresh response has an empty access token"))
            } else {
                Ok(response.access_token)
            }
        });

        match result {
            Ok(access_token) => {
                {
                    let mut state = self.write_state();
                    match state.session.as_mut() {
                        Some(session) => session.access_token = access_token.clone(),
                        None => return Err(Error::NotAuthenticated),
                    }
                    state.error = None;
                }
                if let Err(err) = self.store.save_access_token(&access_token) {
                    log::warn!("failed to persist renewed access token: {}", err);
                }
                log::info!("access token refreshed");
                Ok(access_token)
            }
            Err(err) => {
                log::warn!("token refresh failed: {}", err);
                self.end_session().await;
                self.fail(SESSION_EXPIRED_MESSAGE);
                Err(err)
            }
        }
    }
}
