use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{Session, SessionGate};
use crate::db::Role;
use crate::error::FleetError;
use crate::middleware::auth::{
    SESSION_COOKIE, clear_session_cookie, resolve_gate, session_cookie,
};
use crate::router::FleetState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub username: Option<String>,
    pub role: Option<Role>,
}

impl From<&SessionGate> for SessionInfo {
    fn from(gate: &SessionGate) -> Self {
        Self {
            authenticated: gate.is_authenticated(),
            username: gate.session().map(|s| s.username.clone()),
            role: gate.current_role(),
        }
    }
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="es">
<head><meta charset="utf-8"><title>Acceso al Sistema</title></head>
<body>
<h1>Acceso al Sistema</h1>
{error}
<form method="post" action="/login">
  <label>Usuario <input name="username" autocomplete="username" required></label>
  <label>Contraseña <input name="password" type="password" autocomplete="current-password" required></label>
  <button type="submit">Iniciar Sesión</button>
</form>
</body>
</html>
"#;

/// GET / -> the login gate.
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

/// GET /login -> login form; `?error=...` re-renders after a failed attempt.
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let error = if query.error.is_some() {
        r#"<p role="alert">Usuario o contraseña incorrectos</p>"#
    } else {
        ""
    };
    Html(LOGIN_PAGE.replace("{error}", error))
}

/// POST /login (form) -> sets the session cookie and redirects.
pub async fn form_login(
    State(state): State<FleetState>,
    jar: PrivateCookieJar,
    Form(req): Form<LoginRequest>,
) -> Result<Response, FleetError> {
    match open_session(&state, jar, &req).await {
        Ok((jar, _)) => Ok((jar, Redirect::to("/home")).into_response()),
        Err((jar, FleetError::AuthenticationFailure)) => {
            Ok((jar, Redirect::to("/login?error=1")).into_response())
        }
        Err((_, other)) => Err(other),
    }
}

/// POST /api/login (JSON) -> session info plus cookie, 401 on mismatch.
pub async fn api_login(
    State(state): State<FleetState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<Response, FleetError> {
    let (jar, session) = open_session(&state, jar, &req)
        .await
        .map_err(|(_, e)| e)?;
    let body = SessionInfo::from(&SessionGate::Authenticated(session));
    Ok((jar, Json(body)).into_response())
}

/// POST /logout (form) -> back to the login form.
pub async fn form_logout(State(state): State<FleetState>, jar: PrivateCookieJar) -> Response {
    let jar = close_session(&state, jar).await;
    (jar, Redirect::to("/login")).into_response()
}

/// POST /api/logout -> 204, idempotent.
pub async fn api_logout(State(state): State<FleetState>, jar: PrivateCookieJar) -> Response {
    let jar = close_session(&state, jar).await;
    (jar, StatusCode::NO_CONTENT).into_response()
}

/// GET /api/session -> whether the caller is authenticated and as whom.
pub async fn session_info(
    State(state): State<FleetState>,
    jar: PrivateCookieJar,
) -> Json<SessionInfo> {
    let gate = resolve_gate(&jar, &state).await;
    Json(SessionInfo::from(&gate))
}

/// GET /home -> landing page for authenticated callers.
pub async fn home_page(State(state): State<FleetState>, jar: PrivateCookieJar) -> Response {
    let gate = resolve_gate(&jar, &state).await;
    let Some(session) = gate.session() else {
        return Redirect::to("/login").into_response();
    };
    Html(format!(
        r#"<!doctype html>
<html lang="es">
<head><meta charset="utf-8"><title>Gestión de Flota Vehicular</title></head>
<body>
<p>Bienvenido, <strong>{}</strong> ({})</p>
<form method="post" action="/logout"><button type="submit">Cerrar Sesión</button></form>
</body>
</html>
"#,
        escape_html(&display_name(&session.username)),
        session.role
    ))
    .into_response()
}

async fn open_session(
    state: &FleetState,
    jar: PrivateCookieJar,
    req: &LoginRequest,
) -> Result<(PrivateCookieJar, Session), (PrivateCookieJar, FleetError)> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err((jar, FleetError::AuthenticationFailure));
    }

    match state
        .sessions
        .login(&state.credentials, username, &req.password)
        .await
    {
        Ok(session) => {
            // a failed attempt keeps the session this browser already holds
            let jar = close_session(state, jar).await;
            let jar = jar.add(session_cookie(session.id.clone(), state.insecure_cookie));
            Ok((jar, session))
        }
        Err(e) => Err((jar, e)),
    }
}

async fn close_session(state: &FleetState, jar: PrivateCookieJar) -> PrivateCookieJar {
    let Some(id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
        return jar;
    };
    if state.sessions.logout(&id).await.is_none() {
        info!("stale session cookie cleared");
    }
    jar.remove(clear_session_cookie())
}

/// `admin` -> `Admin`
fn display_name(username: &str) -> String {
    let mut chars = username.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
