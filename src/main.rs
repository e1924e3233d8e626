use clap::Parser;
use flota::cli::{Cli, Command};
use flota::config::Config;
use mimalloc::MiMalloc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load()?;

    let env_filter = if cli.diagnostic {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()))
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_path = %cfg.basic.database_path.display(),
        backup_dir = %cfg.basic.backup_dir.display(),
        listen = %cfg.socket_addr(),
        loglevel = %cfg.basic.loglevel
    );
    if cfg.basic.listen_addr.is_unspecified() {
        warn!("listening on all interfaces; the dashboard is reachable from the network");
    }

    let command = cli.command.unwrap_or(Command::Serve);
    if let Err(e) = flota::cli::run(command, cfg).await {
        error!(error = %e, "fatal");
        return Err(e.into());
    }
    Ok(())
}
