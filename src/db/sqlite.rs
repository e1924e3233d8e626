use crate::db::schema::SQLITE_INIT;
use crate::error::FleetError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

/// Handle to the single embedded database file of one installation.
#[derive(Clone)]
pub struct LocalDatabase {
    pool: SqlitePool,
    path: PathBuf,
}

impl LocalDatabase {
    /// Open the database at `path`, creating the parent directory and the
    /// file when missing, then apply the schema.
    ///
    /// Any failure here is reported as [`FleetError::StoreUnreachable`].
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FleetError> {
        let path = path.as_ref().to_path_buf();
        let err_path = path.clone();
        let unreachable = move |source: sqlx::Error| FleetError::StoreUnreachable {
            path: err_path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| unreachable(sqlx::Error::Io(e)))?;
        }

        let existed = path.exists();
        let connect_opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect_opts)
            .await
            .map_err(&unreachable)?;

        let db = Self { pool, path };
        db.init_schema().await.map_err(|e| match e {
            FleetError::DatabaseError(source) => unreachable(source),
            other => other,
        })?;

        info!(path = %db.path.display(), created = !existed, "local database ready");
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), FleetError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        debug!("schema applied");
        Ok(())
    }

    /// Write a consistent snapshot of the live database to `target`.
    pub async fn snapshot_into(&self, target: &Path) -> Result<(), FleetError> {
        sqlx::query("VACUUM INTO ?")
            .bind(target.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
