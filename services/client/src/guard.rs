//! services/client/src/guard.rs
//!
//! Gates private routes on session presence. A pure predicate over a session
//! snapshot: no network, no async.

use crate::stores::SessionState;

/// The public landing route unauthenticated visitors are sent to.
pub const LOGIN_ROUTE: &str = "/login";

/// An application route, as an opaque path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route(pub String);

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outcome of checking a private route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The session is authenticated; render the requested route.
    Granted,
    /// Not authenticated: redirect to the login route. The attempted
    /// location is preserved so a shell can navigate back after login.
    Redirect { to: Route, attempted: Route },
}

/// Checks whether the session may enter `attempted`.
pub fn check(session: &SessionState, attempted: Route) -> Access {
    if session.is_authenticated {
        Access::Granted
    } else {
        Access::Redirect {
            to: Route::new(LOGIN_ROUTE),
            attempted,
        }
    }
}
