//! `gatehouse-core` — identifiers and errors shared by the guard crates.
//!
//! This crate carries no policy; it only names things.

pub mod error;
pub mod id;

pub use error::CoreError;
pub use id::{ConfirmationId, OrganizationId, PrincipalId};
