use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Local;
use serde::Deserialize;

use crate::db::models::{MaintenancePatch, MaintenanceSchedule, NewMaintenanceSchedule};
use crate::error::FleetError;
use crate::middleware::auth::{RequireAdmin, RequireSession};
use crate::router::FleetState;

#[derive(Debug, Deserialize)]
pub struct MaintenanceQuery {
    pub plate: Option<String>,
    pub status: Option<String>,
    pub within_days: Option<i64>,
}

/// GET /api/maintenance?plate=&status=&within_days= -> soonest first.
pub async fn list_schedules(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<Vec<MaintenanceSchedule>>, FleetError> {
    let today = Local::now().date_naive();
    Ok(Json(
        state
            .fleet
            .maintenance_schedules(
                query.plate.as_deref(),
                query.status.as_deref(),
                query.within_days,
                today,
            )
            .await?,
    ))
}

pub async fn create_schedule(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Json(schedule): Json<NewMaintenanceSchedule>,
) -> Result<(StatusCode, Json<MaintenanceSchedule>), FleetError> {
    let created = state
        .fleet
        .schedule_maintenance(schedule, &session.username)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_schedule(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceSchedule>, FleetError> {
    Ok(Json(state.fleet.maintenance_schedule(id).await?))
}

pub async fn update_schedule(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
    Json(patch): Json<MaintenancePatch>,
) -> Result<Json<MaintenanceSchedule>, FleetError> {
    Ok(Json(
        state
            .fleet
            .update_maintenance(id, patch, &session.username)
            .await?,
    ))
}
