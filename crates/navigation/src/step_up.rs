//! Step-up guarded actions.
//!
//! The confirmation gate only collects a secondary credential; this module
//! checks it against a trusted verifier before the action is allowed to run.

use std::future::Future;

use thiserror::Error;

use gatehouse_auth::{ConfirmationGate, SecondaryCredential};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepUpError {
    #[error("step-up confirmation was cancelled")]
    Cancelled,

    #[error("secondary credential was rejected")]
    Rejected,
}

/// Checks a secondary credential with the authority that issued it.
pub trait SecondaryCredentialVerifier {
    fn verify(&self, credential: &SecondaryCredential) -> impl Future<Output = bool> + Send;
}

/// Run `action` only after the user supplies a secondary credential that
/// `verifier` accepts.
///
/// A cancelled prompt or rejected credential aborts before `action` is called,
/// so the action has no partial effect.
pub async fn guard_with_step_up<V, F, Fut, T>(
    gate: &ConfirmationGate,
    verifier: &V,
    action: F,
) -> Result<T, StepUpError>
where
    V: SecondaryCredentialVerifier,
    F: FnOnce(SecondaryCredential) -> Fut,
    Fut: Future<Output = T>,
{
    let Some(credential) = gate.request_confirmation().await else {
        tracing::info!("guarded action aborted: confirmation cancelled");
        return Err(StepUpError::Cancelled);
    };

    if !verifier.verify(&credential).await {
        tracing::warn!("guarded action aborted: secondary credential rejected");
        return Err(StepUpError::Rejected);
    }

    Ok(action(credential).await)
}
