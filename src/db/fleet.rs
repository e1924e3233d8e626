use crate::db::models::{
    CountBucket, FleetStats, Incident, MonthlyServiceTotal, NewIncident, NewServiceRecord,
    NewVehicle, ServiceRecord, Vehicle, VehiclePatch,
};
use crate::db::sqlite::SqlitePool;
use crate::error::FleetError;
use crate::validators::validate_incident_status;
use chrono::Utc;

pub const DEFAULT_VEHICLE_STATUS: &str = "SERVICIO";
pub const DEFAULT_INCIDENT_STATUS: &str = "PENDIENTE";

const VEHICLE_COLUMNS: &str = "plate, area, kind, brand, model, year, status, km, \
    last_service_date, workshop, notes, vtv_expiry, created_at";

/// Vehicles together with their service and incident history.
#[derive(Clone)]
pub struct FleetStorage {
    pool: SqlitePool,
}

impl FleetStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All vehicles ordered by plate, optionally filtered by a
    /// case-insensitive substring over the descriptive columns.
    pub async fn list_vehicles(&self, search: Option<&str>) -> Result<Vec<Vehicle>, FleetError> {
        let term = search.map(str::trim).filter(|s| !s.is_empty());
        let rows = match term {
            Some(term) => {
                let pattern = format!("%{}%", escape_like(term));
                sqlx::query_as::<_, Vehicle>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM vehicles
                     WHERE plate LIKE ?1 ESCAPE '\\' OR area LIKE ?1 ESCAPE '\\'
                        OR kind LIKE ?1 ESCAPE '\\' OR brand LIKE ?1 ESCAPE '\\'
                        OR model LIKE ?1 ESCAPE '\\' OR status LIKE ?1 ESCAPE '\\'
                     ORDER BY plate"
                ))
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Vehicle>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY plate"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn get_vehicle(&self, plate: &str) -> Result<Option<Vehicle>, FleetError> {
        let row = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE plate = ?"
        ))
        .bind(plate)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a vehicle whose plate has already been normalised.
    pub async fn insert_vehicle(&self, v: NewVehicle) -> Result<Vehicle, FleetError> {
        if self.get_vehicle(&v.plate).await?.is_some() {
            return Err(FleetError::Conflict(format!(
                "vehicle {} already registered",
                v.plate
            )));
        }
        sqlx::query(
            r#"
            INSERT INTO vehicles (
                plate, area, kind, brand, model, year, status, km,
                workshop, notes, vtv_expiry, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&v.plate)
        .bind(v.area)
        .bind(v.kind)
        .bind(v.brand)
        .bind(v.model)
        .bind(v.year)
        .bind(v.status.unwrap_or_else(|| DEFAULT_VEHICLE_STATUS.to_string()))
        .bind(v.km.unwrap_or(0))
        .bind(v.workshop)
        .bind(v.notes)
        .bind(v.vtv_expiry)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_vehicle(&v.plate)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {}", v.plate)))
    }

    pub async fn update_vehicle(
        &self,
        plate: &str,
        patch: VehiclePatch,
    ) -> Result<Vehicle, FleetError> {
        let res = sqlx::query(
            r#"
            UPDATE vehicles SET
                area = COALESCE(?, area),
                kind = COALESCE(?, kind),
                brand = COALESCE(?, brand),
                model = COALESCE(?, model),
                year = COALESCE(?, year),
                status = COALESCE(?, status),
                km = COALESCE(?, km),
                workshop = COALESCE(?, workshop),
                notes = COALESCE(?, notes),
                vtv_expiry = COALESCE(?, vtv_expiry)
            WHERE plate = ?
            "#,
        )
        .bind(patch.area)
        .bind(patch.kind)
        .bind(patch.brand)
        .bind(patch.model)
        .bind(patch.year)
        .bind(patch.status)
        .bind(patch.km)
        .bind(patch.workshop)
        .bind(patch.notes)
        .bind(patch.vtv_expiry)
        .bind(plate)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(FleetError::NotFound(format!("vehicle {plate}")));
        }
        self.get_vehicle(plate)
            .await?
            .ok_or_else(|| FleetError::NotFound(format!("vehicle {plate}")))
    }

    /// Remove a vehicle. Refused while history or schedule rows reference it.
    pub async fn delete_vehicle(&self, plate: &str) -> Result<(), FleetError> {
        let mut tx = self.pool.begin().await?;

        let services: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM service_records WHERE plate = ?")
                .bind(plate)
                .fetch_one(&mut *tx)
                .await?;
        let incidents: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM incidents WHERE plate = ?")
            .bind(plate)
            .fetch_one(&mut *tx)
            .await?;
        let schedules: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM maintenance_schedules WHERE plate = ?")
                .bind(plate)
                .fetch_one(&mut *tx)
                .await?;
        if services.0 > 0 || incidents.0 > 0 || schedules.0 > 0 {
            tx.rollback().await?;
            return Err(FleetError::Conflict(format!(
                "vehicle {plate} has {} service records, {} incidents and {} maintenance schedules",
                services.0, incidents.0, schedules.0
            )));
        }

        let res = sqlx::query("DELETE FROM vehicles WHERE plate = ?")
            .bind(plate)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FleetError::NotFound(format!("vehicle {plate}")));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Record a service and carry its km, date and workshop over to the
    /// vehicle, atomically.
    pub async fn add_service_record(
        &self,
        plate: &str,
        rec: NewServiceRecord,
    ) -> Result<ServiceRecord, FleetError> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query(
            "UPDATE vehicles SET km = ?, last_service_date = ?, workshop = ? WHERE plate = ?",
        )
        .bind(rec.km)
        .bind(rec.date)
        .bind(rec.workshop.clone())
        .bind(plate)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FleetError::NotFound(format!("vehicle {plate}")));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO service_records (plate, date, km, service_kind, workshop, cost, description)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plate)
        .bind(rec.date)
        .bind(rec.km)
        .bind(&rec.service_kind)
        .bind(rec.workshop.clone())
        .bind(rec.cost)
        .bind(rec.description.clone())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ServiceRecord {
            id: inserted.last_insert_rowid(),
            plate: plate.to_string(),
            date: rec.date,
            km: rec.km,
            service_kind: rec.service_kind,
            workshop: rec.workshop,
            cost: rec.cost,
            description: rec.description,
        })
    }

    /// Newest first.
    pub async fn service_history(
        &self,
        plate: Option<&str>,
    ) -> Result<Vec<ServiceRecord>, FleetError> {
        let rows = sqlx::query_as::<_, ServiceRecord>(
            r#"
            SELECT id, plate, date, km, service_kind, workshop, cost, description
            FROM service_records
            WHERE ?1 IS NULL OR plate = ?1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(plate)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn add_incident(&self, inc: NewIncident) -> Result<Incident, FleetError> {
        if self.get_vehicle(&inc.plate).await?.is_none() {
            return Err(FleetError::NotFound(format!("vehicle {}", inc.plate)));
        }
        let status = inc
            .status
            .unwrap_or_else(|| DEFAULT_INCIDENT_STATUS.to_string());
        let inserted = sqlx::query(
            "INSERT INTO incidents (plate, date, kind, description, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&inc.plate)
        .bind(inc.date)
        .bind(&inc.kind)
        .bind(inc.description.clone())
        .bind(&status)
        .execute(&self.pool)
        .await?;

        Ok(Incident {
            id: inserted.last_insert_rowid(),
            plate: inc.plate,
            date: inc.date,
            kind: inc.kind,
            description: inc.description,
            status,
        })
    }

    /// Newest first, optionally narrowed to one vehicle and/or one status.
    pub async fn incidents(
        &self,
        plate: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Incident>, FleetError> {
        let rows = sqlx::query_as::<_, Incident>(
            r#"
            SELECT id, plate, date, kind, description, status
            FROM incidents
            WHERE (?1 IS NULL OR plate = ?1) AND (?2 IS NULL OR status = ?2)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(plate)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update_incident_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Incident, FleetError> {
        validate_incident_status(status)?;
        let res = sqlx::query("UPDATE incidents SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(FleetError::NotFound(format!("incident {id}")));
        }
        let row = sqlx::query_as::<_, Incident>(
            "SELECT id, plate, date, kind, description, status FROM incidents WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn stats(&self) -> Result<FleetStats, FleetError> {
        let by_status = self.count_by("vehicles", "status").await?;
        let by_kind = self.count_by("vehicles", "kind").await?;
        let by_area = self.count_by("vehicles", "area").await?;
        let incidents_by_status = self.count_by("incidents", "status").await?;

        let service_by_month = sqlx::query_as::<_, MonthlyServiceTotal>(
            r#"
            SELECT strftime('%Y-%m', date) AS month,
                   COUNT(*) AS count,
                   COALESCE(SUM(cost), 0.0) AS total_cost
            FROM service_records
            WHERE date >= date('now', '-12 months')
            GROUP BY strftime('%Y-%m', date)
            ORDER BY month
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(FleetStats {
            by_status,
            by_kind,
            by_area,
            incidents_by_status,
            service_by_month,
        })
    }

    // `table` and `column` are compile-time constants from `stats`
    async fn count_by(&self, table: &str, column: &str) -> Result<Vec<CountBucket>, FleetError> {
        let rows = sqlx::query_as::<_, CountBucket>(&format!(
            "SELECT {column} AS label, COUNT(*) AS count FROM {table} GROUP BY {column} ORDER BY {column}"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
