use crate::db::models::{
    FleetStats, Incident, MaintenanceFilter, MaintenancePatch, MaintenanceSchedule,
    NewIncident, NewMaintenanceSchedule, NewServiceRecord, NewVehicle, ServiceRecord, Vehicle,
    VehiclePatch,
};
use crate::db::maintenance::DEFAULT_MAINTENANCE_STATUS;
use crate::db::{FleetStorage, MaintenanceStorage};
use crate::error::FleetError;
use crate::validators::{
    normalize_plate, validate_cost, validate_incident_status, validate_maintenance_status,
    validate_non_negative, validate_required, validate_year,
};
use chrono::{Duration, NaiveDate};
use tracing::info;

/// Days ahead of a scheduled date at which its reminder becomes due.
pub const REMINDER_LEAD_DAYS: i64 = 7;
/// Kilometres short of a scheduled odometer reading at which its reminder
/// becomes due.
pub const REMINDER_KM_MARGIN: i64 = 500;

/// Validated access to fleet records on behalf of an authenticated caller.
#[derive(Clone)]
pub struct FleetOps {
    storage: FleetStorage,
    maintenance: MaintenanceStorage,
}

impl FleetOps {
    pub fn new(storage: FleetStorage, maintenance: MaintenanceStorage) -> Self {
        Self {
            storage,
            maintenance,
        }
    }

    pub async fn list_vehicles(&self, search: Option<&str>) -> Result<Vec<Vehicle>, FleetError> {
        self.storage.list_vehicles(search).await
    }

    pub async fn vehicle(&self, plate: &str) -> Result<Vehicle, FleetError> {
        let plate = normalize_plate(plate)?;
        self.storage
            .get_vehicle(&plate)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {plate}")))
    }

    pub async fn register_vehicle(
        &self,
        mut vehicle: NewVehicle,
        actor: &str,
    ) -> Result<Vehicle, FleetError> {
        vehicle.plate = normalize_plate(&vehicle.plate)?;
        if let Some(year) = vehicle.year {
            validate_year(year)?;
        }
        if let Some(km) = vehicle.km {
            validate_non_negative("km", km)?;
        }
        if let Some(status) = vehicle.status.as_deref() {
            validate_required("status", status)?;
        }
        let created = self.storage.insert_vehicle(vehicle).await?;
        info!(plate = %created.plate, actor, "vehicle registered");
        Ok(created)
    }

    pub async fn update_vehicle(
        &self,
        plate: &str,
        patch: VehiclePatch,
        actor: &str,
    ) -> Result<Vehicle, FleetError> {
        let plate = normalize_plate(plate)?;
        if patch.is_empty() {
            return Err(FleetError::Validation("no fields to update".to_string()));
        }
        if let Some(year) = patch.year {
            validate_year(year)?;
        }
        if let Some(km) = patch.km {
            validate_non_negative("km", km)?;
        }
        if let Some(status) = patch.status.as_deref() {
            validate_required("status", status)?;
        }
        let updated = self.storage.update_vehicle(&plate, patch).await?;
        info!(plate = %plate, actor, "vehicle updated");
        Ok(updated)
    }

    pub async fn delete_vehicle(&self, plate: &str, actor: &str) -> Result<(), FleetError> {
        let plate = normalize_plate(plate)?;
        self.storage.delete_vehicle(&plate).await?;
        info!(plate = %plate, actor, "vehicle deleted");
        Ok(())
    }

    pub async fn add_service_record(
        &self,
        plate: &str,
        record: NewServiceRecord,
        actor: &str,
    ) -> Result<ServiceRecord, FleetError> {
        let plate = normalize_plate(plate)?;
        validate_required("service_kind", &record.service_kind)?;
        validate_non_negative("km", record.km)?;
        validate_cost(record.cost)?;
        let created = self.storage.add_service_record(&plate, record).await?;
        info!(plate = %plate, id = created.id, actor, "service recorded");
        Ok(created)
    }

    pub async fn service_history(
        &self,
        plate: Option<&str>,
    ) -> Result<Vec<ServiceRecord>, FleetError> {
        let plate = plate.map(normalize_plate).transpose()?;
        self.storage.service_history(plate.as_deref()).await
    }

    pub async fn report_incident(
        &self,
        mut incident: NewIncident,
        actor: &str,
    ) -> Result<Incident, FleetError> {
        incident.plate = normalize_plate(&incident.plate)?;
        validate_required("kind", &incident.kind)?;
        if let Some(status) = incident.status.as_deref() {
            validate_incident_status(status)?;
        }
        let created = self.storage.add_incident(incident).await?;
        info!(plate = %created.plate, id = created.id, actor, "incident reported");
        Ok(created)
    }

    pub async fn incidents(
        &self,
        plate: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Incident>, FleetError> {
        let plate = plate.map(normalize_plate).transpose()?;
        self.storage.incidents(plate.as_deref(), status).await
    }

    pub async fn set_incident_status(
        &self,
        id: i64,
        status: &str,
        actor: &str,
    ) -> Result<Incident, FleetError> {
        let updated = self.storage.update_incident_status(id, status.trim()).await?;
        info!(id, status = %updated.status, actor, "incident status changed");
        Ok(updated)
    }

    pub async fn stats(&self) -> Result<FleetStats, FleetError> {
        self.storage.stats().await
    }

    pub async fn schedule_maintenance(
        &self,
        mut schedule: NewMaintenanceSchedule,
        actor: &str,
    ) -> Result<MaintenanceSchedule, FleetError> {
        schedule.plate = normalize_plate(&schedule.plate)?;
        validate_required("service_kind", &schedule.service_kind)?;
        if let Some(km) = schedule.scheduled_km {
            validate_non_negative("scheduled_km", km)?;
        }
        let created = self.maintenance.insert(schedule).await?;
        info!(plate = %created.plate, id = created.id, actor, "maintenance scheduled");
        Ok(created)
    }

    /// Schedules filtered by plate and status. With `within_days`, only those
    /// dated from `today` up to `today + within_days`.
    pub async fn maintenance_schedules(
        &self,
        plate: Option<&str>,
        status: Option<&str>,
        within_days: Option<i64>,
        today: NaiveDate,
    ) -> Result<Vec<MaintenanceSchedule>, FleetError> {
        let plate = plate.map(normalize_plate).transpose()?;
        let (from, until) = match within_days {
            Some(days) => {
                validate_non_negative("within_days", days)?;
                (Some(today), Some(today + Duration::days(days)))
            }
            None => (None, None),
        };
        self.maintenance
            .list(MaintenanceFilter {
                plate: plate.as_deref(),
                status,
                from,
                until,
            })
            .await
    }

    pub async fn maintenance_schedule(&self, id: i64) -> Result<MaintenanceSchedule, FleetError> {
        self.maintenance
            .get(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("maintenance schedule {id}")))
    }

    pub async fn update_maintenance(
        &self,
        id: i64,
        patch: MaintenancePatch,
        actor: &str,
    ) -> Result<MaintenanceSchedule, FleetError> {
        if patch.is_empty() {
            return Err(FleetError::Validation("no fields to update".to_string()));
        }
        if let Some(status) = patch.status.as_deref() {
            validate_maintenance_status(status)?;
        }
        if let Some(kind) = patch.service_kind.as_deref() {
            validate_required("service_kind", kind)?;
        }
        if let Some(km) = patch.scheduled_km {
            validate_non_negative("scheduled_km", km)?;
        }
        let updated = self.maintenance.update(id, patch).await?;
        info!(id, status = %updated.status, actor, "maintenance schedule updated");
        Ok(updated)
    }

    /// The pending schedule a vehicle's next reminder is about: the earliest
    /// one not yet reminded, else the earliest pending one.
    pub async fn next_pending_maintenance(
        &self,
        plate: &str,
    ) -> Result<MaintenanceSchedule, FleetError> {
        let plate = normalize_plate(plate)?;
        let pending = self
            .maintenance
            .list(MaintenanceFilter {
                plate: Some(&plate),
                status: Some(DEFAULT_MAINTENANCE_STATUS),
                ..Default::default()
            })
            .await?;
        let fallback = pending.first().cloned();
        pending
            .into_iter()
            .find(|s| !s.reminder_sent)
            .or(fallback)
            .ok_or_else(|| FleetError::NotFound(format!("pending maintenance for vehicle {plate}")))
    }

    /// Schedules whose reminder should go out as of `today`.
    pub async fn due_reminders(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<MaintenanceSchedule>, FleetError> {
        self.maintenance
            .due_reminders(today + Duration::days(REMINDER_LEAD_DAYS), REMINDER_KM_MARGIN)
            .await
    }

    pub async fn mark_reminder_sent(&self, id: i64) -> Result<MaintenanceSchedule, FleetError> {
        self.maintenance
            .update(
                id,
                MaintenancePatch {
                    reminder_sent: Some(true),
                    ..Default::default()
                },
            )
            .await
    }
}
