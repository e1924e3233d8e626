//! SQL DDL for initializing the local fleet database.

/// SQLite schema with:
/// - `accounts`: one row per username, Argon2 PHC hash, role `admin`/`user`
/// - `vehicles`: keyed by normalised licence plate
/// - `service_records` / `incidents`: history rows referencing a vehicle
/// - `maintenance_schedules`: planned services that drive SMS reminders
/// - `messages`: account-to-account messages
///
/// Timestamps are RFC3339 text, calendar dates are `YYYY-MM-DD` text.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    username TEXT PRIMARY KEY NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'user')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicles (
    plate TEXT PRIMARY KEY NOT NULL,
    area TEXT NULL,
    kind TEXT NULL,
    brand TEXT NULL,
    model TEXT NULL,
    year INTEGER NULL,
    status TEXT NOT NULL DEFAULT 'SERVICIO',
    km INTEGER NOT NULL DEFAULT 0,
    last_service_date TEXT NULL,
    workshop TEXT NULL,
    notes TEXT NULL,
    vtv_expiry TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS service_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plate TEXT NOT NULL REFERENCES vehicles(plate),
    date TEXT NOT NULL,
    km INTEGER NOT NULL,
    service_kind TEXT NOT NULL,
    workshop TEXT NULL,
    cost REAL NOT NULL DEFAULT 0,
    description TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_service_records_plate ON service_records(plate);

CREATE TABLE IF NOT EXISTS incidents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plate TEXT NOT NULL REFERENCES vehicles(plate),
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    description TEXT NULL,
    status TEXT NOT NULL DEFAULT 'PENDIENTE'
);

CREATE INDEX IF NOT EXISTS idx_incidents_plate ON incidents(plate);

CREATE TABLE IF NOT EXISTS maintenance_schedules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plate TEXT NOT NULL REFERENCES vehicles(plate),
    scheduled_date TEXT NOT NULL,
    scheduled_km INTEGER NULL,
    service_kind TEXT NOT NULL,
    description TEXT NULL,
    reminder_sent INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'PENDIENTE'
        CHECK (status IN ('PENDIENTE', 'COMPLETADO', 'CANCELADO')),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_maintenance_schedules_plate ON maintenance_schedules(plate);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender TEXT NOT NULL REFERENCES accounts(username),
    recipient TEXT NOT NULL REFERENCES accounts(username),
    body TEXT NOT NULL,
    sent_at TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient)
"#;
