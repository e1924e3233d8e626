use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::AccountSummary;
use crate::error::FleetError;
use crate::middleware::auth::{RequireAdmin, RequireSession, clear_session_cookie};
use crate::router::FleetState;
use crate::service::{BackupInfo, TableExport};

#[derive(Debug, Deserialize)]
pub struct ChangeOwnPassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPassword {
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBackupRequest {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub dir: String,
    pub tables: Vec<TableExport>,
}

pub async fn list_accounts(
    State(state): State<FleetState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<AccountSummary>>, FleetError> {
    Ok(Json(state.credentials.list_accounts().await?))
}

/// POST /api/account/password -> the caller changes their own password.
/// Every session of the account, this one included, is closed.
pub async fn change_own_password(
    State(state): State<FleetState>,
    RequireSession(session): RequireSession,
    jar: PrivateCookieJar,
    Json(req): Json<ChangeOwnPassword>,
) -> Result<Response, FleetError> {
    if state
        .credentials
        .verify(&session.username, &req.current_password)
        .await?
        .is_none()
    {
        warn!(username = %session.username, "password change with wrong current password");
        return Err(FleetError::AuthenticationFailure);
    }
    state
        .credentials
        .set_password(&session.username, &req.new_password)
        .await?;
    state.sessions.revoke_user(&session.username).await;
    Ok((jar.remove(clear_session_cookie()), StatusCode::NO_CONTENT).into_response())
}

/// PUT /api/accounts/{username}/password -> admin resets any password.
pub async fn reset_password(
    State(state): State<FleetState>,
    RequireAdmin(admin): RequireAdmin,
    Path(username): Path<String>,
    Json(req): Json<ResetPassword>,
) -> Result<StatusCode, FleetError> {
    state
        .credentials
        .set_password(&username, &req.password)
        .await?;
    let revoked = state.sessions.revoke_user(&username).await;
    info!(target_user = %username, by = %admin.username, revoked, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_backups(
    State(state): State<FleetState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<BackupInfo>>, FleetError> {
    Ok(Json(state.backups.list_backups()?))
}

/// POST /api/backups with an optional `{"description": ...}` body.
pub async fn create_backup(
    State(state): State<FleetState>,
    RequireAdmin(admin): RequireAdmin,
    req: Option<Json<CreateBackupRequest>>,
) -> Result<(StatusCode, Json<BackupInfo>), FleetError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let backup = state
        .backups
        .create_backup(&state.db, req.description.as_deref())
        .await?;
    info!(file = %backup.file_name, by = %admin.username, "backup requested");
    Ok((StatusCode::CREATED, Json(backup)))
}

/// POST /api/backups/export -> every table as CSV under the backup dir.
pub async fn export_csv(
    State(state): State<FleetState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<(StatusCode, Json<ExportResponse>), FleetError> {
    let dir = state.backups.export_dir();
    let tables = state.backups.export_csv(&state.db, &dir).await?;
    info!(dir = %dir.display(), by = %admin.username, "csv export requested");
    Ok((
        StatusCode::CREATED,
        Json(ExportResponse {
            dir: dir.display().to_string(),
            tables,
        }),
    ))
}
