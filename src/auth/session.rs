//! Session gate and the in-memory registry of live browser sessions.
//!
//! Sessions live only in process memory. They end on logout, when the
//! owning account's password changes, or when the process exits; there is
//! no idle or absolute timeout.

use crate::auth::credential_store::CredentialStore;
use crate::db::Role;
use crate::error::FleetError;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub type SessionId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub id: SessionId,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

/// Authentication state of one caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionGate {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl SessionGate {
    /// Move to `Authenticated` if the store accepts the credentials. On a
    /// mismatch the gate stays as it was.
    pub async fn login(
        &mut self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<&Session, FleetError> {
        let Some(role) = store.verify(username, password).await? else {
            warn!(username, "login rejected");
            return Err(FleetError::AuthenticationFailure);
        };
        *self = SessionGate::Authenticated(Session {
            id: new_session_id(),
            username: username.to_string(),
            role,
            issued_at: Utc::now(),
        });
        match &*self {
            SessionGate::Authenticated(session) => Ok(session),
            SessionGate::Anonymous => Err(FleetError::AuthenticationFailure),
        }
    }

    pub fn logout(&mut self) {
        *self = SessionGate::Anonymous;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionGate::Authenticated(_))
    }

    pub fn current_role(&self) -> Option<Role> {
        self.session().map(|s| s.role)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionGate::Authenticated(session) => Some(session),
            SessionGate::Anonymous => None,
        }
    }
}

/// Live sessions keyed by the opaque id carried in the session cookie.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify credentials and register a new session for them.
    pub async fn login(
        &self,
        store: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<Session, FleetError> {
        let mut gate = SessionGate::Anonymous;
        let session = gate.login(store, username, password).await?.clone();
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        info!(username, role = %session.role, "session opened");
        Ok(session)
    }

    /// Gate for the caller holding `id`; unknown or missing ids are anonymous.
    pub async fn gate(&self, id: Option<&str>) -> SessionGate {
        let Some(id) = id else {
            return SessionGate::Anonymous;
        };
        match self.sessions.read().await.get(id) {
            Some(session) => SessionGate::Authenticated(session.clone()),
            None => SessionGate::Anonymous,
        }
    }

    pub async fn logout(&self, id: &str) -> Option<Session> {
        let removed = self.sessions.write().await.remove(id);
        if let Some(session) = &removed {
            info!(username = %session.username, "session closed");
        }
        removed
    }

    /// Drop every session of `username`. Returns how many were removed.
    pub async fn revoke_user(&self, username: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.username != username);
        let revoked = before - sessions.len();
        if revoked > 0 {
            info!(username, revoked, "sessions revoked");
        }
        revoked
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn new_session_id() -> SessionId {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
