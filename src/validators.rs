//! Input checks applied before anything reaches storage.

use crate::error::FleetError;
use chrono::{Datelike, Utc};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_VEHICLE_YEAR: i64 = 1900;
pub const INCIDENT_STATUSES: [&str; 3] = ["PENDIENTE", "EN PROCESO", "RESUELTO"];
pub const MAINTENANCE_STATUSES: [&str; 3] = ["PENDIENTE", "COMPLETADO", "CANCELADO"];

/// Validate and normalise an Argentine licence plate.
///
/// Accepts the legacy `ABC123` and Mercosur `AB123CD` layouts, case
/// insensitive, with optional spaces or dashes between groups. Returns the
/// upper-case plate with separators removed.
pub fn normalize_plate(raw: &str) -> Result<String, FleetError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FleetError::Validation("plate must not be empty".to_string()));
    }
    let compact: String = trimmed
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if is_legacy_plate(&compact) || is_mercosur_plate(&compact) {
        Ok(compact)
    } else {
        Err(FleetError::Validation(format!(
            "invalid plate `{trimmed}`; expected ABC123 or AB123CD"
        )))
    }
}

fn is_legacy_plate(p: &str) -> bool {
    let b = p.as_bytes();
    b.len() == 6 && b[..3].iter().all(u8::is_ascii_uppercase) && b[3..].iter().all(u8::is_ascii_digit)
}

fn is_mercosur_plate(p: &str) -> bool {
    let b = p.as_bytes();
    b.len() == 7
        && b[..2].iter().all(u8::is_ascii_uppercase)
        && b[2..5].iter().all(u8::is_ascii_digit)
        && b[5..].iter().all(u8::is_ascii_uppercase)
}

pub fn validate_password(password: &str) -> Result<(), FleetError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FleetError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Model year between 1900 and next year.
pub fn validate_year(year: i64) -> Result<(), FleetError> {
    let max = i64::from(Utc::now().year()) + 1;
    if !(MIN_VEHICLE_YEAR..=max).contains(&year) {
        return Err(FleetError::Validation(format!(
            "year must be between {MIN_VEHICLE_YEAR} and {max}"
        )));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: i64) -> Result<(), FleetError> {
    if value < 0 {
        return Err(FleetError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}

pub fn validate_cost(cost: f64) -> Result<(), FleetError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(FleetError::Validation(
            "cost must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str) -> Result<(), FleetError> {
    if value.trim().is_empty() {
        return Err(FleetError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_incident_status(status: &str) -> Result<(), FleetError> {
    validate_one_of("incident status", status, &INCIDENT_STATUSES)
}

pub fn validate_maintenance_status(status: &str) -> Result<(), FleetError> {
    validate_one_of("maintenance status", status, &MAINTENANCE_STATUSES)
}

fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), FleetError> {
    if !allowed.contains(&value) {
        return Err(FleetError::Validation(format!(
            "{field} must be one of {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}
