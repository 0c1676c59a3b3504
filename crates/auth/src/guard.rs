use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Capability, PermissionTable, Principal, Role, Session};

/// Outcome of a navigation check. Exactly one per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationDecision {
    Allow,
    RedirectLogin,
    RedirectForceCredentialChange,
    RedirectHome,
}

impl AuthorizationDecision {
    /// The caller must clear local session state before redirecting.
    pub fn requires_logout(self) -> bool {
        matches!(self, Self::RedirectLogin)
    }

    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Which evaluation rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    NoPrincipal,
    NoSession,
    SessionExpired,
    CredentialChangeRequired,
    RouteNotPermitted,
    RoutePermitted,
}

impl DecisionRule {
    fn decision(self) -> AuthorizationDecision {
        match self {
            Self::NoPrincipal | Self::NoSession | Self::SessionExpired => {
                AuthorizationDecision::RedirectLogin
            }
            Self::CredentialChangeRequired => AuthorizationDecision::RedirectForceCredentialChange,
            Self::RouteNotPermitted => AuthorizationDecision::RedirectHome,
            Self::RoutePermitted => AuthorizationDecision::Allow,
        }
    }
}

/// Well-known paths the guard redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardPaths {
    pub login: String,
    /// The only protected path reachable while a credential change is pending.
    pub credential_change: String,
    pub home: String,
}

impl Default for GuardPaths {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            credential_change: "/settings".to_string(),
            home: "/".to_string(),
        }
    }
}

/// Navigation decision engine.
///
/// Holds an immutable permission table; `decide` is pure and may be called on
/// every navigation. Clearing the session on `RedirectLogin` is the caller's
/// job (see [`AuthorizationDecision::requires_logout`]).
#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: Arc<PermissionTable>,
    paths: GuardPaths,
}

impl RouteGuard {
    pub fn new(table: Arc<PermissionTable>, paths: GuardPaths) -> Self {
        Self { table, paths }
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn paths(&self) -> &GuardPaths {
        &self.paths
    }

    pub fn decide(
        &self,
        principal: Option<&Principal>,
        session: Option<&Session>,
        target: &str,
    ) -> AuthorizationDecision {
        self.decide_at(principal, session, target, Utc::now())
    }

    pub fn decide_at(
        &self,
        principal: Option<&Principal>,
        session: Option<&Session>,
        target: &str,
        now: DateTime<Utc>,
    ) -> AuthorizationDecision {
        let rule = self.evaluate(principal, session, target, now);
        let decision = rule.decision();
        tracing::debug!(target_path = target, ?rule, ?decision, "route guard decision");
        decision
    }

    /// First matching rule wins; the order below is part of the contract.
    fn evaluate(
        &self,
        principal: Option<&Principal>,
        session: Option<&Session>,
        target: &str,
        now: DateTime<Utc>,
    ) -> DecisionRule {
        let Some(principal) = principal else {
            return DecisionRule::NoPrincipal;
        };
        let Some(session) = session else {
            return DecisionRule::NoSession;
        };
        if !session.is_live_at(now) {
            return DecisionRule::SessionExpired;
        }
        if principal.must_change_credential && target != self.paths.credential_change {
            return DecisionRule::CredentialChangeRequired;
        }
        if !self.table.is_route_allowed(&principal.role, target) {
            return DecisionRule::RouteNotPermitted;
        }
        DecisionRule::RoutePermitted
    }

    /// Where the presentation layer should go for `decision`; `None` for `Allow`.
    pub fn redirect_target(&self, decision: AuthorizationDecision) -> Option<&str> {
        match decision {
            AuthorizationDecision::Allow => None,
            AuthorizationDecision::RedirectLogin => Some(&self.paths.login),
            AuthorizationDecision::RedirectForceCredentialChange => {
                Some(&self.paths.credential_change)
            }
            AuthorizationDecision::RedirectHome => Some(&self.paths.home),
        }
    }

    /// Explain why a navigation decision was made (or would be made).
    ///
    /// Produces the same decision as [`decide_at`](Self::decide_at) plus an
    /// audit-friendly account of which rule fired.
    pub fn explain_at(
        &self,
        principal: Option<&Principal>,
        session: Option<&Session>,
        target: &str,
        now: DateTime<Utc>,
    ) -> DecisionExplanation {
        let rule = self.evaluate(principal, session, target, now);
        let role = principal.map(|p| p.role.clone());
        let matched_pattern = principal
            .and_then(|p| self.table.matched_pattern(&p.role, target))
            .map(|p| p.as_str().to_string());

        let reason = match rule {
            DecisionRule::NoPrincipal => "no authenticated principal".to_string(),
            DecisionRule::NoSession => "no session credential present".to_string(),
            DecisionRule::SessionExpired => match session.and_then(Session::expires_at) {
                Some(at) => format!("session expired at {}", at.to_rfc3339()),
                None => "session credential has no decodable expiry".to_string(),
            },
            DecisionRule::CredentialChangeRequired => format!(
                "credential change pending; only '{}' is reachable",
                self.paths.credential_change
            ),
            DecisionRule::RouteNotPermitted => format!(
                "role '{}' has no route pattern matching '{}'",
                role.as_ref().map(Role::as_str).unwrap_or_default(),
                target
            ),
            DecisionRule::RoutePermitted => format!(
                "route '{}' permitted by pattern '{}'",
                target,
                matched_pattern.as_deref().unwrap_or_default()
            ),
        };

        DecisionExplanation {
            target: target.to_string(),
            decision: rule.decision(),
            rule,
            reason,
            role,
            matched_pattern,
        }
    }

    /// Check every capability an action requires.
    pub fn authorize_action<A: CapabilityRequirement + ?Sized>(
        &self,
        principal: Option<&Principal>,
        action: &A,
    ) -> Result<(), AuthzError> {
        let principal = principal.ok_or(AuthzError::Unauthenticated)?;
        for capability in action.required_capabilities() {
            authorize_capability(&self.table, principal, capability)?;
        }
        Ok(())
    }
}

/// Audit record for a navigation decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub target: String,
    pub decision: AuthorizationDecision,
    pub rule: DecisionRule,
    pub reason: String,
    pub role: Option<Role>,
    /// Pattern that grants the role this route, when one exists (reported even
    /// if an earlier rule denied the navigation).
    pub matched_pattern: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no authenticated principal")]
    Unauthenticated,

    #[error("credential change required before performing actions")]
    CredentialChangeRequired,

    #[error("forbidden: missing capability '{0}'")]
    Forbidden(String),
}

/// Action-side authorization contract.
///
/// Implement this on actions that require capabilities; the UI checks them
/// before offering or running the action.
pub trait CapabilityRequirement {
    fn required_capabilities(&self) -> &[Capability];
}

/// Authorize a single capability for `principal`.
///
/// - No IO
/// - No panics
/// - Unknown roles hold no capabilities
pub fn authorize_capability(
    table: &PermissionTable,
    principal: &Principal,
    required: &Capability,
) -> Result<(), AuthzError> {
    if principal.must_change_credential {
        return Err(AuthzError::CredentialChangeRequired);
    }
    if table.has_capability(&principal.role, required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
