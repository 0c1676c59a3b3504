//! `gatehouse-navigation` — wires the guard into a front-end's navigation.
//!
//! The guard crate only decides. This crate reads the current session, applies
//! the logout side effect, runs step-up guarded actions and loads configuration.

pub mod check;
pub mod config;
pub mod context;
pub mod navigator;
pub mod step_up;

pub use check::RouteCheck;
pub use config::{ConfigError, NavigationConfig};
pub use context::{InMemorySessionStore, SessionSource};
pub use navigator::{NavigationOutcome, Navigator};
pub use step_up::{SecondaryCredentialVerifier, StepUpError, guard_with_step_up};
