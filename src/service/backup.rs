//! Snapshot, list, restore and CSV export of the database file.
//!
//! Backups are plain SQLite files named `backup_<YYYYmmdd_HHMMSS>.db`, each
//! with a `<file>.meta` sidecar of `key=value` lines. Restoring replaces the
//! live file, so it runs offline from the CLI, never while the server holds
//! the pool open.

use crate::db::LocalDatabase;
use crate::error::FleetError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::Row;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BACKUP_PREFIX: &str = "backup_";
const PRE_RESTORE_PREFIX: &str = "pre_restore_";
const BACKUP_EXT: &str = ".db";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const META_EXT: &str = ".meta";
const EXPORT_PREFIX: &str = "export_";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupInfo {
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub description: Option<String>,
}

/// One table written out by [`BackupManager::export_csv`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableExport {
    pub table: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a consistent snapshot of the live database into the backup dir,
    /// plus its `.meta` sidecar. Without a description a dated one is used.
    pub async fn create_backup(
        &self,
        db: &LocalDatabase,
        description: Option<&str>,
    ) -> Result<BackupInfo, FleetError> {
        fs::create_dir_all(&self.dir)?;
        let mut target = self.dir.join(stamped_name(BACKUP_PREFIX));
        // two backups within the same second
        let mut n = 1;
        while target.exists() {
            target = self.dir.join(format!(
                "{BACKUP_PREFIX}{}_{n}{BACKUP_EXT}",
                Local::now().format(STAMP_FORMAT)
            ));
            n += 1;
        }

        db.snapshot_into(&target).await?;
        let description = match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => d.replace(['\r', '\n'], " "),
            None => format!(
                "Backup completo creado el {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
        };
        fs::write(
            meta_path(&target),
            format!(
                "timestamp={}\nsource_db={}\nbackup_path={}\ndescription={description}\n",
                Local::now().format(STAMP_FORMAT),
                db.path().display(),
                target.display(),
            ),
        )?;
        let info = describe_backup(&target)?;
        info!(path = %target.display(), size = info.size_bytes, "backup created");
        Ok(info)
    }

    /// Backups in the directory, newest first. A missing directory is empty.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, FleetError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut backups: Vec<BackupInfo> = fs::read_dir(&self.dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(error = %e, "failed to read backup dir entry");
                    None
                }
            })
            .filter(|path| is_backup_file(path))
            .filter_map(|path| {
                describe_backup(&path)
                    .inspect_err(|e| warn!(path = %path.display(), error = %e, "unreadable backup"))
                    .ok()
            })
            .collect();
        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(backups)
    }

    /// Directory a fresh export lands in when the caller names none.
    pub fn export_dir(&self) -> PathBuf {
        self.dir
            .join(format!("{EXPORT_PREFIX}{}", Local::now().format(STAMP_FORMAT)))
    }

    /// Write every user table to `<dir>/<table>.csv`, header row first.
    /// Values are exported as their SQLite text form, NULL as an empty field.
    pub async fn export_csv(
        &self,
        db: &LocalDatabase,
        dir: &Path,
    ) -> Result<Vec<TableExport>, FleetError> {
        fs::create_dir_all(dir)?;
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await?;

        let mut exports = Vec::with_capacity(tables.len());
        for (table,) in tables {
            let columns: Vec<(String,)> =
                sqlx::query_as("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
                    .bind(&table)
                    .fetch_all(db.pool())
                    .await?;
            if columns.is_empty() {
                continue;
            }
            let select = columns
                .iter()
                .map(|(c,)| format!("CAST({} AS TEXT)", quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            let rows = sqlx::query(&format!("SELECT {select} FROM {}", quote_ident(&table)))
                .fetch_all(db.pool())
                .await?;

            let path = dir.join(format!("{table}.csv"));
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(columns.iter().map(|(c,)| c.as_str()))?;
            for row in &rows {
                let mut record = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    record.push(row.try_get::<Option<String>, _>(i)?.unwrap_or_default());
                }
                writer.write_record(&record)?;
            }
            writer.flush()?;

            exports.push(TableExport {
                table,
                path,
                rows: rows.len(),
            });
        }
        info!(dir = %dir.display(), tables = exports.len(), "tables exported to csv");
        Ok(exports)
    }

    /// Resolve a backup given either a bare file name inside the backup dir
    /// or a path.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf, FleetError> {
        let direct = PathBuf::from(name_or_path);
        let candidate = if direct.is_file() {
            direct
        } else {
            self.dir.join(name_or_path)
        };
        if !candidate.is_file() {
            return Err(FleetError::NotFound(format!("backup {name_or_path}")));
        }
        Ok(candidate)
    }

    /// Replace `db_path` with `backup`, keeping the current file as
    /// `pre_restore_<ts>.db` first. Returns the safety copy path, if any.
    pub fn restore_backup(
        &self,
        backup: &Path,
        db_path: &Path,
    ) -> Result<Option<PathBuf>, FleetError> {
        if !backup.is_file() {
            return Err(FleetError::NotFound(format!("backup {}", backup.display())));
        }
        fs::create_dir_all(&self.dir)?;

        let safety = if db_path.exists() {
            let safety = self.dir.join(stamped_name(PRE_RESTORE_PREFIX));
            fs::copy(db_path, &safety)?;
            Some(safety)
        } else {
            None
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::copy(backup, db_path)?;
        // stale WAL/SHM files would be replayed over the restored file
        for suffix in ["-wal", "-shm"] {
            let side = PathBuf::from(format!("{}{suffix}", db_path.display()));
            if side.exists() {
                fs::remove_file(&side)?;
            }
        }

        info!(
            from = %backup.display(),
            to = %db_path.display(),
            safety_copy = ?safety.as_ref().map(|p| p.display().to_string()),
            "backup restored"
        );
        Ok(safety)
    }
}

fn stamped_name(prefix: &str) -> String {
    format!("{prefix}{}{BACKUP_EXT}", Local::now().format(STAMP_FORMAT))
}

fn is_backup_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXT))
        == Some(true)
}

fn meta_path(backup: &Path) -> PathBuf {
    PathBuf::from(format!("{}{META_EXT}", backup.display()))
}

/// `description=` line of the sidecar, if the sidecar exists.
fn read_description(backup: &Path) -> Option<String> {
    let meta = fs::read_to_string(meta_path(backup)).ok()?;
    meta.lines()
        .find_map(|line| line.strip_prefix("description="))
        .map(|d| d.trim().to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn describe_backup(path: &Path) -> Result<BackupInfo, FleetError> {
    let meta = fs::metadata(path)?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(BackupInfo {
        created_at: parse_stamp(&file_name),
        file_name,
        path: path.to_path_buf(),
        size_bytes: meta.len(),
        description: read_description(path),
    })
}

/// Timestamp embedded in `backup_<stamp>[_n].db`, read as local time.
fn parse_stamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_EXT)?;
    let stamp = stem.get(..15)?;
    let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
