//! Route-level authorization gating

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{Role, SessionManager, User};
use crate::config::ClientOptions;

/// Moves the client to another view
///
/// The view layer supplies the implementation; the core only decides where
/// to go.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the move in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        log::info!("navigate to {}", route);
    }
}

/// Outcome of gating a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render,
    RedirectToLogin,
    RedirectToUnauthorized,
}

impl RouteDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, RouteDecision::Render)
    }
}

/// Decide whether `user` may see a view restricted to `required_roles`
///
/// `None` or an empty set admits any authenticated user.
pub fn authorize(user: Option<&User>, required_roles: Option<&[Role]>) -> RouteDecision {
    let user = match user {
        Some(user) => user,
        None => return RouteDecision::RedirectToLogin,
    };

    match required_roles {
        Some(roles) if !roles.is_empty() && !roles.contains(&user.user_role) => {
            RouteDecision::RedirectToUnauthorized
        }
        _ => RouteDecision::Render,
    }
}

/// Which routes need a session, and which roles they admit
///
/// A route is matched against its longest registered prefix ending at a
/// path-segment boundary, so `/view-post/42` follows the rule for
/// `/view-post`. Unregistered routes are public.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    routes: HashMap<String, Option<Vec<Role>>>,
}

impl RoutePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Views of the forum client
    pub fn forum() -> Self {
        Self::new()
            .protect("/post")
            .protect("/view-post")
            .protect("/upload-document")
            .protect("/view-document")
            .protect("/search")
            .protect("/account")
            .restrict("/account/users", &[Role::Admin])
    }

    /// Require any authenticated user for `route`
    pub fn protect(mut self, route: &str) -> Self {
        self.routes.insert(normalize(route), None);
        self
    }

    /// Require one of `roles` for `route`
    pub fn restrict(mut self, route: &str, roles: &[Role]) -> Self {
        self.routes.insert(normalize(route), Some(roles.to_vec()));
        self
    }

    /// The rule for `route`: `None` when public, `Some(None)` for any
    /// authenticated user, `Some(Some(roles))` when role-restricted
    pub fn rule(&self, route: &str) -> Option<Option<&[Role]>> {
        let mut candidate = normalize(route);
        loop {
            if let Some(roles) = self.routes.get(&candidate) {
                return Some(roles.as_deref());
            }
            match candidate.rfind('/') {
                Some(0) | None => return None,
                Some(idx) => candidate.truncate(idx),
            }
        }
    }

    pub fn is_public(&self, route: &str) -> bool {
        self.rule(route).is_none()
    }
}

fn normalize(route: &str) -> String {
    let path = route.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Gates views on the current session
///
/// Every call reads a fresh snapshot of the session; no decision is cached.
pub struct RouteGuard {
    session: Arc<SessionManager>,
    policy: RoutePolicy,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    unauthorized_route: String,
}

impl RouteGuard {
    pub fn new(
        session: Arc<SessionManager>,
        policy: RoutePolicy,
        navigator: Arc<dyn Navigator>,
        options: &ClientOptions,
    ) -> Self {
        Self {
            session,
            policy,
            navigator,
            login_route: options.login_route.clone(),
            unauthorized_route: options.unauthorized_route.clone(),
        }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Gate a protected view that admits `required_roles`
    pub fn check(&self, required_roles: Option<&[Role]>) -> RouteDecision {
        let user = self.session.current_user();
        authorize(user.as_ref(), required_roles)
    }

    /// Gate `route` according to the policy
    pub fn evaluate(&self, route: &str) -> RouteDecision {
        match self.policy.rule(route) {
            None => RouteDecision::Render,
            Some(required_roles) => self.check(required_roles),
        }
    }

    /// Where the client ends up for `decision` on `route`
    pub fn destination<'a>(&'a self, route: &'a str, decision: RouteDecision) -> &'a str {
        match decision {
            RouteDecision::Render => route,
            RouteDecision::RedirectToLogin => &self.login_route,
            RouteDecision::RedirectToUnauthorized => &self.unauthorized_route,
        }
    }

    /// Evaluate `route` and move the client to the resulting view
    pub fn navigate(&self, route: &str) -> RouteDecision {
        let decision = self.evaluate(route);
        if !decision.is_render() {
            log::debug!("{} denied: {:?}", route, decision);
        }
        self.navigator.navigate(self.destination(route, decision));
        decision
    }
}
