use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::db::models::{MaintenanceSchedule, Message};
use crate::error::FleetError;
use crate::middleware::auth::{RequireAdmin, RequireSession};
use crate::router::FleetState;
use crate::service::messaging::{VtvAlert, vtv_alerts as collect_vtv_alerts};

const DEFAULT_VTV_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub body: String,
}

/// Without `schedule_id` the vehicle's next pending schedule is used.
#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    pub phone: String,
    pub schedule_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub simulated: bool,
    pub schedule_id: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VtvQuery {
    pub within_days: Option<i64>,
}

pub async fn inbox(
    State(state): State<FleetState>,
    RequireSession(session): RequireSession,
) -> Result<Json<Vec<Message>>, FleetError> {
    Ok(Json(state.messaging.inbox(&session.username).await?))
}

pub async fn send_message(
    State(state): State<FleetState>,
    RequireSession(session): RequireSession,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), FleetError> {
    let msg = state
        .messaging
        .send(&session.username, req.to.trim(), &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(msg)))
}

pub async fn mark_read(
    State(state): State<FleetState>,
    RequireSession(session): RequireSession,
    Path(id): Path<i64>,
) -> Result<StatusCode, FleetError> {
    state.messaging.mark_read(id, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/vehicles/{plate}/reminder -> simulated SMS about a scheduled
/// maintenance; the schedule is flagged as reminded.
pub async fn maintenance_reminder(
    State(state): State<FleetState>,
    RequireAdmin(_): RequireAdmin,
    Path(plate): Path<String>,
    Json(req): Json<ReminderRequest>,
) -> Result<Json<ReminderResponse>, FleetError> {
    let vehicle = state.fleet.vehicle(&plate).await?;
    let schedule = match req.schedule_id {
        Some(id) => {
            let schedule = state.fleet.maintenance_schedule(id).await?;
            if schedule.plate != vehicle.plate {
                return Err(FleetError::NotFound(format!(
                    "maintenance schedule {id} for vehicle {}",
                    vehicle.plate
                )));
            }
            schedule
        }
        None => state.fleet.next_pending_maintenance(&vehicle.plate).await?,
    };
    let text = state
        .messaging
        .send_maintenance_reminder(&req.phone, &vehicle, &schedule)?;
    state.fleet.mark_reminder_sent(schedule.id).await?;
    Ok(Json(ReminderResponse {
        simulated: true,
        schedule_id: schedule.id,
        text,
    }))
}

/// GET /api/maintenance/reminders -> schedules whose reminder is due.
pub async fn due_reminders(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
) -> Result<Json<Vec<MaintenanceSchedule>>, FleetError> {
    let today = Local::now().date_naive();
    Ok(Json(state.fleet.due_reminders(today).await?))
}

/// GET /api/alerts/vtv?within_days=N -> vehicles whose VTV is due.
pub async fn vtv_alerts(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Query(query): Query<VtvQuery>,
) -> Result<Json<Vec<VtvAlert>>, FleetError> {
    let within = query.within_days.unwrap_or(DEFAULT_VTV_WINDOW_DAYS);
    if within < 0 {
        return Err(FleetError::Validation(
            "within_days must not be negative".to_string(),
        ));
    }
    let vehicles = state.fleet.list_vehicles(None).await?;
    let today = Local::now().date_naive();
    Ok(Json(collect_vtv_alerts(&vehicles, today, within)))
}
