//! `gatehouse-auth` — client-side navigation and action gating.
//!
//! This crate is intentionally decoupled from rendering and transport. It
//! decides; the caller redirects, clears sessions, and prompts.

pub mod confirmation;
pub mod guard;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod route;
pub mod session;

pub use confirmation::{
    ConfirmationGate, ConfirmationRequest, ConfirmationStatus, GateError, GateState,
    SecondaryCredential,
};
pub use guard::{
    AuthorizationDecision, AuthzError, CapabilityRequirement, DecisionExplanation, DecisionRule,
    GuardPaths, RouteGuard, authorize_capability,
};
pub use permissions::{
    Capability, PermissionConfigError, PermissionEntry, PermissionEntryConfig, PermissionTable,
    PermissionTableConfig,
};
pub use principal::Principal;
pub use roles::Role;
pub use route::{PatternError, RouteParams, RoutePattern};
pub use session::{
    Credential, CredentialDecoder, DecodeError, DecodedCredential, JwtExpiryDecoder, Session,
    expiry_of,
};

pub use gatehouse_core::{ConfirmationId, OrganizationId, PrincipalId};
