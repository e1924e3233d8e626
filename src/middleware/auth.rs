use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};

use crate::auth::{Session, SessionGate};
use crate::error::FleetError;
use crate::router::FleetState;

pub const SESSION_COOKIE: &str = "flota_session";

/// Resolve the caller's gate from the encrypted session cookie.
pub async fn resolve_gate(jar: &PrivateCookieJar<Key>, state: &FleetState) -> SessionGate {
    let id = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    state.sessions.gate(id.as_deref()).await
}

/// Browser-session cookie: no `Max-Age`, so it dies with the browser session.
pub fn session_cookie(id: String, insecure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .build()
}

/// Any authenticated caller. Anonymous requests are rejected with 401.
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

impl FromRequestParts<FleetState> for RequireSession {
    type Rejection = FleetError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FleetState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
        match resolve_gate(&jar, state).await {
            SessionGate::Authenticated(session) => Ok(Self(session)),
            SessionGate::Anonymous => Err(FleetError::Unauthenticated),
        }
    }
}

/// Authenticated caller holding the admin role; 401 when anonymous, 403
/// for regular users.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Session);

impl FromRequestParts<FleetState> for RequireAdmin {
    type Rejection = FleetError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FleetState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSession(session) = RequireSession::from_request_parts(parts, state).await?;
        if !session.role.is_admin() {
            tracing::warn!(username = %session.username, path = %parts.uri.path(), "admin route denied");
            return Err(FleetError::Forbidden);
        }
        Ok(Self(session))
    }
}
