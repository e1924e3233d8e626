use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// Full account row, including the password hash. Never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct DbAccount {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Account as exposed to callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountSummary {
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<DbAccount> for AccountSummary {
    fn from(a: DbAccount) -> Self {
        Self {
            username: a.username,
            role: a.role,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Vehicle {
    pub plate: String,
    pub area: Option<String>,
    pub kind: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub status: String,
    pub km: i64,
    pub last_service_date: Option<NaiveDate>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
    pub vtv_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a vehicle. `plate` is validated and normalised
/// before it reaches storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVehicle {
    pub plate: String,
    pub area: Option<String>,
    pub kind: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub status: Option<String>,
    pub km: Option<i64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
    pub vtv_expiry: Option<NaiveDate>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiclePatch {
    pub area: Option<String>,
    pub kind: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub status: Option<String>,
    pub km: Option<i64>,
    pub workshop: Option<String>,
    pub notes: Option<String>,
    pub vtv_expiry: Option<NaiveDate>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.area.is_none()
            && self.kind.is_none()
            && self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.status.is_none()
            && self.km.is_none()
            && self.workshop.is_none()
            && self.notes.is_none()
            && self.vtv_expiry.is_none()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct ServiceRecord {
    pub id: i64,
    pub plate: String,
    pub date: NaiveDate,
    pub km: i64,
    pub service_kind: String,
    pub workshop: Option<String>,
    pub cost: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewServiceRecord {
    pub date: NaiveDate,
    pub km: i64,
    pub service_kind: String,
    pub workshop: Option<String>,
    #[serde(default)]
    pub cost: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct Incident {
    pub id: i64,
    pub plate: String,
    pub date: NaiveDate,
    pub kind: String,
    pub description: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncident {
    pub plate: String,
    pub date: NaiveDate,
    pub kind: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct MaintenanceSchedule {
    pub id: i64,
    pub plate: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_km: Option<i64>,
    pub service_kind: String,
    pub description: Option<String>,
    pub reminder_sent: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaintenanceSchedule {
    pub plate: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_km: Option<i64>,
    pub service_kind: String,
    pub description: Option<String>,
}

/// Partial update of a schedule; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenancePatch {
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_km: Option<i64>,
    pub service_kind: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub reminder_sent: Option<bool>,
}

impl MaintenancePatch {
    pub fn is_empty(&self) -> bool {
        self.scheduled_date.is_none()
            && self.scheduled_km.is_none()
            && self.service_kind.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.reminder_sent.is_none()
    }
}

/// Filters for listing schedules. `until` bounds `scheduled_date` from
/// above and `from` from below.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceFilter<'a> {
    pub plate: Option<&'a str>,
    pub status: Option<&'a str>,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub recipient: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct CountBucket {
    pub label: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct MonthlyServiceTotal {
    pub month: String,
    pub count: i64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FleetStats {
    pub by_status: Vec<CountBucket>,
    pub by_kind: Vec<CountBucket>,
    pub by_area: Vec<CountBucket>,
    pub incidents_by_status: Vec<CountBucket>,
    pub service_by_month: Vec<MonthlyServiceTotal>,
}
