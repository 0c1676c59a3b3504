//! Step-up confirmation gate.
//!
//! An irreversible action awaits [`ConfirmationGate::request_confirmation`];
//! the UI observes the pending request through [`ConfirmationGate::subscribe`],
//! shows a prompt, and answers with [`resolve`](ConfirmationGate::resolve) or
//! [`cancel`](ConfirmationGate::cancel).
//!
//! State machine: `Idle -> Pending -> {Resolved | Cancelled} -> Idle`.
//!
//! Overlap policy: one pending request at a time. A request issued while
//! another is pending resolves immediately with `None`; the pending one is
//! left untouched.
//!
//! The gate only collects the secondary credential. Verifying it is up to the
//! guarded action.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{oneshot, watch};

use gatehouse_core::ConfirmationId;

/// Credential typed into the step-up prompt. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecondaryCredential(String);

impl SecondaryCredential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SecondaryCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecondaryCredential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Resolved,
    Cancelled,
}

/// Observable snapshot of a confirmation request (never carries the credential).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationRequest {
    pub id: ConfirmationId,
    pub created_at: DateTime<Utc>,
    pub status: ConfirmationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Pending(ConfirmationId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("confirmation request {0} is not pending")]
    NotPending(ConfirmationId),
}

struct PendingSlot {
    request: ConfirmationRequest,
    responder: oneshot::Sender<Option<SecondaryCredential>>,
}

struct Inner {
    slot: Mutex<Option<PendingSlot>>,
    observed: watch::Sender<Option<ConfirmationRequest>>,
    timeout: Option<Duration>,
}

/// Single-slot asynchronous rendezvous between an action and a human.
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct ConfirmationGate {
    inner: Arc<Inner>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("state", &self.state())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A gate whose prompts expire after `timeout`; expiry counts as cancellation.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let (observed, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                observed,
                timeout,
            }),
        }
    }

    // The slot holds no invariant a panicking holder could break halfway, so a
    // poisoned lock is recovered rather than propagated.
    fn slot(&self) -> MutexGuard<'_, Option<PendingSlot>> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> GateState {
        match self.slot().as_ref() {
            Some(pending) => GateState::Pending(pending.request.id),
            None => GateState::Idle,
        }
    }

    /// The request currently awaiting the user, if any.
    pub fn pending(&self) -> Option<ConfirmationRequest> {
        self.slot().as_ref().map(|p| p.request.clone())
    }

    /// Follow the pending request; `Some` while a prompt should be visible.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConfirmationRequest>> {
        self.inner.observed.subscribe()
    }

    /// Ask the user for a secondary credential.
    ///
    /// Resolves exactly once: `Some` when the user confirms, `None` when the
    /// prompt is cancelled, dismissed, times out, or another request is
    /// already pending.
    pub async fn request_confirmation(&self) -> Option<SecondaryCredential> {
        let (id, rx) = {
            let mut slot = self.slot();
            if let Some(current) = slot.as_ref() {
                tracing::warn!(
                    pending = %current.request.id,
                    "confirmation already pending; rejecting new request"
                );
                return None;
            }

            let (tx, rx) = oneshot::channel();
            let request = ConfirmationRequest {
                id: ConfirmationId::new(),
                created_at: Utc::now(),
                status: ConfirmationStatus::Pending,
            };
            let id = request.id;
            self.inner.observed.send_replace(Some(request.clone()));
            *slot = Some(PendingSlot {
                request,
                responder: tx,
            });
            (id, rx)
        };

        tracing::info!(confirmation = %id, "step-up confirmation requested");

        // Clears the slot if this future is dropped or times out before an answer.
        let _release = SlotRelease { gate: self, id };

        let answer = match self.inner.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(answer) => answer,
                Err(_) => {
                    tracing::info!(confirmation = %id, "step-up confirmation timed out");
                    return None;
                }
            },
            None => rx.await,
        };

        // A dropped responder only happens if the slot was torn down; treat as cancel.
        answer.unwrap_or(None)
    }

    /// Answer the pending request `id` with `credential`.
    pub fn resolve(
        &self,
        id: ConfirmationId,
        credential: SecondaryCredential,
    ) -> Result<ConfirmationRequest, GateError> {
        self.finish(id, Some(credential))
    }

    /// Cancel the pending request `id`; the caller receives `None`.
    pub fn cancel(&self, id: ConfirmationId) -> Result<ConfirmationRequest, GateError> {
        self.finish(id, None)
    }

    /// Cancel whatever is pending (the prompt was closed without input).
    pub fn dismiss(&self) -> Option<ConfirmationRequest> {
        let id = self.pending()?.id;
        self.cancel(id).ok()
    }

    fn finish(
        &self,
        id: ConfirmationId,
        answer: Option<SecondaryCredential>,
    ) -> Result<ConfirmationRequest, GateError> {
        let pending = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(p) if p.request.id == id => {
                    self.inner.observed.send_replace(None);
                    slot.take()
                }
                _ => None,
            }
        }
        .ok_or(GateError::NotPending(id))?;

        let status = if answer.is_some() {
            ConfirmationStatus::Resolved
        } else {
            ConfirmationStatus::Cancelled
        };
        tracing::info!(confirmation = %id, ?status, "step-up confirmation finished");

        // The waiter may already be gone (dropped future); nothing to deliver then.
        let _ = pending.responder.send(answer);

        Ok(ConfirmationRequest {
            status,
            ..pending.request
        })
    }
}

struct SlotRelease<'a> {
    gate: &'a ConfirmationGate,
    id: ConfirmationId,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        let mut slot = self.gate.slot();
        if slot.as_ref().is_some_and(|p| p.request.id == self.id) {
            *slot = None;
            self.gate.inner.observed.send_replace(None);
            tracing::debug!(confirmation = %self.id, "abandoned confirmation released");
        }
    }
}
