//! Command line surface: serving the dashboard plus offline maintenance.

use crate::config::Config;
use crate::db::LocalDatabase;
use crate::error::FleetError;
use crate::router::{FleetState, fleet_router};
use crate::service::BackupManager;
use clap::{Parser, Subcommand};
use std::io::{BufRead, ErrorKind};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const NEW_PASSWORD_ENV: &str = "FLOTA_NEW_PASSWORD";

/// Local fleet-management dashboard server.
#[derive(Parser, Debug)]
#[command(name = "flota")]
#[command(about = "Local fleet-management dashboard with a login gate")]
pub struct Cli {
    /// Verbose console logging for troubleshooting launches.
    #[arg(long, global = true)]
    pub diagnostic: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the dashboard (default).
    Serve,
    /// Set a new password for an account. Reads it from FLOTA_NEW_PASSWORD
    /// or the first line of stdin.
    SetPassword { username: String },
    /// Snapshot the database into the backup directory.
    Backup {
        /// Stored in the backup's .meta file and shown by `backups`.
        #[arg(long)]
        description: Option<String>,
    },
    /// List available backups, newest first.
    Backups,
    /// Replace the database with a backup. Run with the server stopped.
    Restore {
        /// File name inside the backup directory, or a path.
        backup: String,
    },
    /// Write every table as CSV. Defaults to `<backup_dir>/export_<stamp>`.
    ExportCsv {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

pub async fn run(command: Command, cfg: Config) -> Result<(), FleetError> {
    match command {
        Command::Serve => serve(cfg).await,
        Command::SetPassword { username } => set_password(&cfg, &username).await,
        Command::Backup { description } => {
            let db = LocalDatabase::open(&cfg.basic.database_path).await?;
            let backup = BackupManager::new(&cfg.basic.backup_dir)
                .create_backup(&db, description.as_deref())
                .await;
            db.close().await;
            let backup = backup?;
            println!("{}", backup.path.display());
            Ok(())
        }
        Command::Backups => {
            for b in BackupManager::new(&cfg.basic.backup_dir).list_backups()? {
                let when = b
                    .created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{}\t{} bytes\t{}",
                    b.file_name,
                    when,
                    b.size_bytes,
                    b.description.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Command::Restore { backup } => {
            let manager = BackupManager::new(&cfg.basic.backup_dir);
            let source = manager.resolve(&backup)?;
            let safety = manager.restore_backup(&source, &cfg.basic.database_path)?;
            // reopen once so a broken backup is reported now, not at next launch
            let db = LocalDatabase::open(&cfg.basic.database_path).await?;
            db.close().await;
            if let Some(safety) = safety {
                println!("previous database saved to {}", safety.display());
            }
            Ok(())
        }
        Command::ExportCsv { dir } => {
            let manager = BackupManager::new(&cfg.basic.backup_dir);
            let dir = dir.unwrap_or_else(|| manager.export_dir());
            let db = LocalDatabase::open(&cfg.basic.database_path).await?;
            let exported = manager.export_csv(&db, &dir).await;
            db.close().await;
            for table in exported? {
                println!("{}\t{} rows", table.path.display(), table.rows);
            }
            Ok(())
        }
    }
}

pub async fn serve(cfg: Config) -> Result<(), FleetError> {
    let state = FleetState::open(&cfg).await?;
    let listener = bind(cfg.socket_addr()).await?;

    let app = fleet_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    info!("server stopped");
    Ok(())
}

/// Bind the dashboard listener, reporting an occupied port as
/// [`FleetError::PortInUse`].
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, FleetError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| match e.kind() {
        ErrorKind::AddrInUse => FleetError::PortInUse(addr),
        _ => FleetError::Io(e),
    })?;
    info!("HTTP server listening on http://{}", addr);
    Ok(listener)
}

async fn set_password(cfg: &Config, username: &str) -> Result<(), FleetError> {
    let password = match std::env::var(NEW_PASSWORD_ENV) {
        Ok(p) => p,
        Err(_) => read_password_line()?,
    };
    let state = FleetState::open(cfg).await?;
    let result = state.credentials.set_password(username, &password).await;
    state.db.close().await;
    result?;
    println!("password updated for {username}");
    Ok(())
}

fn read_password_line() -> Result<String, FleetError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
