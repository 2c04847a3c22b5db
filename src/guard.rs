//! Route guard applied before every navigation.
//!
//! SYSTEM CONTEXT
//! ==============
//! Signed-out users may only reach the public-only routes (login, register);
//! signed-in users are bounced off those routes to home. The decision is a
//! pure function of the store's `is_authenticated()` and the target path, so
//! it holds no memory of earlier redirects.

use tracing::debug;

use crate::config::DEFAULT_PUBLIC_ROUTES;
use crate::session::SessionStore;
use crate::storage::SessionStorage;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Outcome of a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    public_routes: Vec<String>,
    home_route: String,
    login_route: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ROUTES.iter().map(|r| (*r).to_owned()).collect())
    }
}

impl RouteGuard {
    /// Guard with the given public-only routes and the standard redirect
    /// targets.
    #[must_use]
    pub fn new(public_routes: Vec<String>) -> Self {
        Self { public_routes, home_route: HOME_ROUTE.to_owned(), login_route: LOGIN_ROUTE.to_owned() }
    }

    #[must_use]
    pub fn with_redirects(mut self, home_route: impl Into<String>, login_route: impl Into<String>) -> Self {
        self.home_route = home_route.into();
        self.login_route = login_route.into();
        self
    }

    #[must_use]
    pub fn is_public_only(&self, path: &str) -> bool {
        let path = route_path(path);
        self.public_routes.iter().any(|r| r == path)
    }

    /// Decide a navigation to `path` for a user who is (or is not) signed in.
    #[must_use]
    pub fn decide(&self, authenticated: bool, path: &str) -> Navigation {
        let public_only = self.is_public_only(path);
        if authenticated && public_only {
            debug!(path, to = %self.home_route, "signed in; leaving public-only route");
            return Navigation::Redirect(self.home_route.clone());
        }
        if !authenticated && !public_only {
            debug!(path, to = %self.login_route, "signed out; protected route");
            return Navigation::Redirect(self.login_route.clone());
        }
        Navigation::Allow
    }

    /// Decide a navigation against the store's current session.
    #[must_use]
    pub fn check<S: SessionStorage>(&self, store: &SessionStore<S>, path: &str) -> Navigation {
        self.decide(store.is_authenticated(), path)
    }
}

/// The path component of a navigation target, without query or fragment.
fn route_path(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
