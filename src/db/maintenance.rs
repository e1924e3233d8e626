use crate::db::models::{
    MaintenanceFilter, MaintenancePatch, MaintenanceSchedule, NewMaintenanceSchedule,
};
use crate::db::sqlite::SqlitePool;
use crate::error::FleetError;
use chrono::{NaiveDate, Utc};

pub const DEFAULT_MAINTENANCE_STATUS: &str = "PENDIENTE";

const SCHEDULE_COLUMNS: &str = "m.id, m.plate, m.scheduled_date, m.scheduled_km, m.service_kind, \
    m.description, m.reminder_sent, m.status, m.created_at";

/// Planned services per vehicle.
#[derive(Clone)]
pub struct MaintenanceStorage {
    pool: SqlitePool,
}

impl MaintenanceStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a schedule for an existing vehicle; the plate is expected
    /// normalised.
    pub async fn insert(
        &self,
        new: NewMaintenanceSchedule,
    ) -> Result<MaintenanceSchedule, FleetError> {
        let vehicle: Option<(String,)> = sqlx::query_as("SELECT plate FROM vehicles WHERE plate = ?")
            .bind(&new.plate)
            .fetch_optional(&self.pool)
            .await?;
        if vehicle.is_none() {
            return Err(FleetError::NotFound(format!("vehicle {}", new.plate)));
        }

        let res = sqlx::query(
            r#"
            INSERT INTO maintenance_schedules (
                plate, scheduled_date, scheduled_km, service_kind, description,
                reminder_sent, status, created_at
            ) VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&new.plate)
        .bind(new.scheduled_date)
        .bind(new.scheduled_km)
        .bind(&new.service_kind)
        .bind(new.description.as_deref())
        .bind(DEFAULT_MAINTENANCE_STATUS)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = res.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("maintenance schedule {id}")))
    }

    pub async fn get(&self, id: i64) -> Result<Option<MaintenanceSchedule>, FleetError> {
        let row = sqlx::query_as::<_, MaintenanceSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM maintenance_schedules m WHERE m.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Soonest first.
    pub async fn list(
        &self,
        filter: MaintenanceFilter<'_>,
    ) -> Result<Vec<MaintenanceSchedule>, FleetError> {
        let rows = sqlx::query_as::<_, MaintenanceSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS} FROM maintenance_schedules m
            WHERE (?1 IS NULL OR m.plate = ?1)
              AND (?2 IS NULL OR m.status = ?2)
              AND (?3 IS NULL OR m.scheduled_date >= ?3)
              AND (?4 IS NULL OR m.scheduled_date <= ?4)
            ORDER BY m.scheduled_date ASC, m.id ASC
            "#
        ))
        .bind(filter.plate)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.until)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: MaintenancePatch,
    ) -> Result<MaintenanceSchedule, FleetError> {
        let res = sqlx::query(
            r#"
            UPDATE maintenance_schedules SET
                scheduled_date = COALESCE(?, scheduled_date),
                scheduled_km = COALESCE(?, scheduled_km),
                service_kind = COALESCE(?, service_kind),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                reminder_sent = COALESCE(?, reminder_sent)
            WHERE id = ?
            "#,
        )
        .bind(patch.scheduled_date)
        .bind(patch.scheduled_km)
        .bind(patch.service_kind)
        .bind(patch.description)
        .bind(patch.status)
        .bind(patch.reminder_sent)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(FleetError::NotFound(format!("maintenance schedule {id}")));
        }
        self.get(id)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("maintenance schedule {id}")))
    }

    /// Pending schedules whose reminder has not gone out yet and that are
    /// either dated on or before `until`, or whose vehicle is within
    /// `km_margin` of the scheduled odometer reading.
    pub async fn due_reminders(
        &self,
        until: NaiveDate,
        km_margin: i64,
    ) -> Result<Vec<MaintenanceSchedule>, FleetError> {
        let rows = sqlx::query_as::<_, MaintenanceSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM maintenance_schedules m
            JOIN vehicles v ON v.plate = m.plate
            WHERE m.status = ?1
              AND m.reminder_sent = 0
              AND (m.scheduled_date <= ?2
                   OR (m.scheduled_km IS NOT NULL AND v.km >= m.scheduled_km - ?3))
            ORDER BY m.scheduled_date ASC, m.id ASC
            "#
        ))
        .bind(DEFAULT_MAINTENANCE_STATUS)
        .bind(until)
        .bind(km_margin)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
