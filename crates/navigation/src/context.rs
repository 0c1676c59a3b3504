use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use gatehouse_auth::{Principal, Session};

/// The session-owning collaborator the navigator reads from.
///
/// Implementations own login/logout; the navigator only calls `logout` when a
/// decision tells it to.
pub trait SessionSource {
    fn current_principal(&self) -> Option<Principal>;
    fn current_session(&self) -> Option<Session>;
    fn logout(&self);
}

impl<S: SessionSource + ?Sized> SessionSource for &S {
    fn current_principal(&self) -> Option<Principal> {
        (**self).current_principal()
    }

    fn current_session(&self) -> Option<Session> {
        (**self).current_session()
    }

    fn logout(&self) {
        (**self).logout()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    principal: Option<Principal>,
    session: Option<Session>,
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: RwLock<SessionState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, principal: Principal, session: Session) {
        tracing::info!(principal = %principal.id, role = %principal.role, "session started");
        let mut state = self.write();
        state.principal = Some(principal);
        state.session = Some(session);
    }

    pub fn is_logged_in(&self) -> bool {
        let state = self.read();
        state.principal.is_some() && state.session.is_some()
    }

    // Session state is replaced wholesale, so a poisoned lock still holds a
    // consistent value.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionSource for InMemorySessionStore {
    fn current_principal(&self) -> Option<Principal> {
        self.read().principal.clone()
    }

    fn current_session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    fn logout(&self) {
        let mut state = self.write();
        if let Some(principal) = state.principal.take() {
            tracing::info!(principal = %principal.id, "session cleared");
        }
        state.session = None;
    }
}
