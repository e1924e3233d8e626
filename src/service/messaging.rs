use crate::db::models::{MaintenanceSchedule, Message, Vehicle};
use crate::db::{AccountsStorage, MessagesStorage};
use crate::error::FleetError;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

const SIGNATURE: &str = "Sistema de Gestión de Flota Vehicular.";

#[derive(Clone)]
pub struct Messaging {
    messages: MessagesStorage,
    accounts: AccountsStorage,
}

impl Messaging {
    pub fn new(messages: MessagesStorage, accounts: AccountsStorage) -> Self {
        Self { messages, accounts }
    }

    pub async fn send(
        &self,
        sender: &str,
        recipient: &str,
        body: &str,
    ) -> Result<Message, FleetError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(FleetError::Validation(
                "message body must not be empty".to_string(),
            ));
        }
        if !self.accounts.exists(recipient).await? {
            return Err(FleetError::NotFound(format!("account {recipient}")));
        }
        let msg = self.messages.insert(sender, recipient, body).await?;
        info!(id = msg.id, sender, recipient, "message sent");
        Ok(msg)
    }

    pub async fn inbox(&self, username: &str) -> Result<Vec<Message>, FleetError> {
        self.messages.inbox(username).await
    }

    pub async fn mark_read(&self, id: i64, username: &str) -> Result<(), FleetError> {
        if !self.messages.mark_read(id, username).await? {
            return Err(FleetError::NotFound(format!("message {id}")));
        }
        Ok(())
    }

    /// Log a simulated SMS reminder for a scheduled maintenance. Nothing
    /// leaves the machine.
    pub fn send_maintenance_reminder(
        &self,
        phone: &str,
        vehicle: &Vehicle,
        schedule: &MaintenanceSchedule,
    ) -> Result<String, FleetError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(FleetError::Validation(
                "phone number must not be empty".to_string(),
            ));
        }
        let text = maintenance_reminder_text(
            vehicle,
            Some(schedule.scheduled_date),
            schedule.scheduled_km,
        );
        info!(
            to = phone,
            plate = %vehicle.plate,
            schedule = schedule.id,
            text = %text,
            "simulated SMS sent"
        );
        Ok(text)
    }
}

pub fn maintenance_reminder_text(
    vehicle: &Vehicle,
    date: Option<NaiveDate>,
    km: Option<i64>,
) -> String {
    let mut text = format!(
        "RECORDATORIO: El vehículo {} ({}) ",
        vehicle.plate,
        describe(vehicle)
    );
    if let Some(date) = date {
        text.push_str(&format!(
            "tiene programado un servicio para el día {}. ",
            date.format("%Y-%m-%d")
        ));
    }
    if let Some(km) = km.filter(|k| *k > 0) {
        text.push_str(&format!("Debe realizarse un servicio al alcanzar {km} km. "));
    }
    text.push_str(SIGNATURE);
    text
}

/// Alert text for a VTV (technical inspection) expiry `days_left` days away;
/// zero or negative means already expired.
pub fn vtv_expiry_alert_text(vehicle: &Vehicle, expiry: NaiveDate, days_left: i64) -> String {
    let mut text = format!(
        "ALERTA: La VTV del vehículo {} ({}) ",
        vehicle.plate,
        describe(vehicle)
    );
    let date = expiry.format("%Y-%m-%d");
    if days_left <= 0 {
        text.push_str(&format!("venció el {date}. "));
    } else {
        text.push_str(&format!("vence el {date} (en {days_left} días). "));
    }
    text.push_str("Por favor, programe la renovación a la brevedad. ");
    text.push_str(SIGNATURE);
    text
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VtvAlert {
    pub plate: String,
    pub expiry: NaiveDate,
    pub days_left: i64,
    pub text: String,
}

/// Alerts for vehicles whose VTV expires within `within_days` of `today`,
/// already-expired ones included, soonest first.
pub fn vtv_alerts(vehicles: &[Vehicle], today: NaiveDate, within_days: i64) -> Vec<VtvAlert> {
    let mut alerts: Vec<VtvAlert> = vehicles
        .iter()
        .filter_map(|v| {
            let expiry = v.vtv_expiry?;
            let days_left = (expiry - today).num_days();
            (days_left <= within_days).then(|| VtvAlert {
                plate: v.plate.clone(),
                expiry,
                days_left,
                text: vtv_expiry_alert_text(v, expiry, days_left),
            })
        })
        .collect();
    alerts.sort_by_key(|a| a.days_left);
    alerts
}

fn describe(vehicle: &Vehicle) -> String {
    [vehicle.brand.as_deref(), vehicle.model.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}
