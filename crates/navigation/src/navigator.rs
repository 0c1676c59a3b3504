use chrono::{DateTime, Utc};
use serde::Serialize;

use gatehouse_auth::{AuthorizationDecision, RouteGuard};

use crate::SessionSource;

/// What the presentation layer should do with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationOutcome {
    pub target: String,
    pub decision: AuthorizationDecision,
    /// `None` when the target may be rendered.
    pub redirect_to: Option<String>,
    /// Set when the local session was cleared as part of this navigation.
    pub logged_out: bool,
}

/// Runs every navigation through the route guard.
#[derive(Debug, Clone)]
pub struct Navigator<S> {
    guard: RouteGuard,
    sessions: S,
}

impl<S: SessionSource> Navigator<S> {
    pub fn new(guard: RouteGuard, sessions: S) -> Self {
        Self { guard, sessions }
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub fn navigate(&self, target: &str) -> NavigationOutcome {
        self.navigate_at(target, Utc::now())
    }

    pub fn navigate_at(&self, target: &str, now: DateTime<Utc>) -> NavigationOutcome {
        let principal = self.sessions.current_principal();
        let session = self.sessions.current_session();

        let decision = self
            .guard
            .decide_at(principal.as_ref(), session.as_ref(), target, now);

        // A stale session must not survive to trigger the same redirect again.
        let logged_out = decision.requires_logout();
        if logged_out {
            self.sessions.logout();
        }

        let redirect_to = self.guard.redirect_target(decision).map(str::to_string);
        if let Some(to) = &redirect_to {
            tracing::info!(
                target_path = target,
                redirect_to = %to,
                ?decision,
                "navigation redirected"
            );
        }

        NavigationOutcome {
            target: target.to_string(),
            decision,
            redirect_to,
            logged_out,
        }
    }
}
