use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::models::{
    FleetStats, Incident, NewIncident, NewServiceRecord, NewVehicle, ServiceRecord, Vehicle,
    VehiclePatch,
};
use crate::error::FleetError;
use crate::middleware::auth::{RequireAdmin, RequireSession};
use crate::router::FleetState;

#[derive(Debug, Deserialize)]
pub struct VehicleQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncidentQuery {
    pub plate: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncidentStatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub plate: Option<String>,
}

pub async fn list_vehicles(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<Vec<Vehicle>>, FleetError> {
    Ok(Json(state.fleet.list_vehicles(query.q.as_deref()).await?))
}

pub async fn get_vehicle(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Path(plate): Path<String>,
) -> Result<Json<Vehicle>, FleetError> {
    Ok(Json(state.fleet.vehicle(&plate).await?))
}

pub async fn create_vehicle(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Json(vehicle): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), FleetError> {
    let created = state
        .fleet
        .register_vehicle(vehicle, &session.username)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_vehicle(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Path(plate): Path<String>,
    Json(patch): Json<VehiclePatch>,
) -> Result<Json<Vehicle>, FleetError> {
    Ok(Json(
        state
            .fleet
            .update_vehicle(&plate, patch, &session.username)
            .await?,
    ))
}

pub async fn delete_vehicle(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Path(plate): Path<String>,
) -> Result<StatusCode, FleetError> {
    state.fleet.delete_vehicle(&plate, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vehicle_services(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Path(plate): Path<String>,
) -> Result<Json<Vec<ServiceRecord>>, FleetError> {
    Ok(Json(state.fleet.service_history(Some(&plate)).await?))
}

pub async fn all_services(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Vec<ServiceRecord>>, FleetError> {
    Ok(Json(
        state
            .fleet
            .service_history(query.plate.as_deref())
            .await?,
    ))
}

pub async fn add_service(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Path(plate): Path<String>,
    Json(record): Json<NewServiceRecord>,
) -> Result<(StatusCode, Json<ServiceRecord>), FleetError> {
    let created = state
        .fleet
        .add_service_record(&plate, record, &session.username)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_incidents(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
    Query(query): Query<IncidentQuery>,
) -> Result<Json<Vec<Incident>>, FleetError> {
    Ok(Json(
        state
            .fleet
            .incidents(query.plate.as_deref(), query.status.as_deref())
            .await?,
    ))
}

pub async fn report_incident(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Json(incident): Json<NewIncident>,
) -> Result<(StatusCode, Json<Incident>), FleetError> {
    let created = state
        .fleet
        .report_incident(incident, &session.username)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/incidents/{id} -> move an incident between PENDIENTE,
/// EN PROCESO and RESUELTO.
pub async fn update_incident_status(
    State(state): State<FleetState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<IncidentStatusUpdate>,
) -> Result<Json<Incident>, FleetError> {
    Ok(Json(
        state
            .fleet
            .set_incident_status(id, &req.status, &session.username)
            .await?,
    ))
}

pub async fn stats(
    State(state): State<FleetState>,
    RequireSession(_): RequireSession,
) -> Result<Json<FleetStats>, FleetError> {
    Ok(Json(state.fleet.stats().await?))
}
