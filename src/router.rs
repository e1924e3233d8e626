use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, patch, post, put};
use axum_extra::extract::cookie::Key;

use crate::auth::{CredentialHasher, CredentialStore, SessionRegistry};
use crate::config::Config;
use crate::db::{AccountsStorage, FleetStorage, LocalDatabase, MaintenanceStorage, MessagesStorage};
use crate::error::FleetError;
use crate::handlers::{accounts, auth, fleet, maintenance, messages};
use crate::service::{BackupManager, FleetOps, Messaging};

/// Everything a request handler needs, injected rather than global.
#[derive(Clone)]
pub struct FleetState {
    pub db: LocalDatabase,
    pub credentials: CredentialStore,
    pub sessions: SessionRegistry,
    pub fleet: FleetOps,
    pub messaging: Messaging,
    pub backups: BackupManager,
    pub insecure_cookie: bool,
    cookie_key: Key,
}

impl FromRef<FleetState> for Key {
    fn from_ref(state: &FleetState) -> Self {
        state.cookie_key.clone()
    }
}

impl FleetState {
    /// Open (or create) the database named in `cfg`, bootstrap the
    /// credential store and assemble the state.
    pub async fn open(cfg: &Config) -> Result<Self, FleetError> {
        let db = LocalDatabase::open(&cfg.basic.database_path).await?;
        let hasher = CredentialHasher::new(cfg.hashing.params()?)?;
        let state = Self::new(db, hasher, cfg.cookie_key()?, cfg);
        state.credentials.bootstrap(&cfg.bootstrap).await?;
        Ok(state)
    }

    pub fn new(db: LocalDatabase, hasher: CredentialHasher, cookie_key: Key, cfg: &Config) -> Self {
        let pool = db.pool().clone();
        let accounts = AccountsStorage::new(pool.clone());
        Self {
            credentials: CredentialStore::new(accounts.clone(), hasher),
            sessions: SessionRegistry::new(),
            fleet: FleetOps::new(
                FleetStorage::new(pool.clone()),
                MaintenanceStorage::new(pool.clone()),
            ),
            messaging: Messaging::new(MessagesStorage::new(pool), accounts),
            backups: BackupManager::new(cfg.basic.backup_dir.clone()),
            insecure_cookie: cfg.basic.insecure_cookie,
            cookie_key,
            db,
        }
    }
}

pub fn fleet_router(state: FleetState) -> Router {
    let api = Router::new()
        .route("/session", get(auth::session_info))
        .route("/login", post(auth::api_login))
        .route("/logout", post(auth::api_logout))
        .route("/vehicles", get(fleet::list_vehicles).post(fleet::create_vehicle))
        .route(
            "/vehicles/{plate}",
            get(fleet::get_vehicle)
                .patch(fleet::update_vehicle)
                .delete(fleet::delete_vehicle),
        )
        .route(
            "/vehicles/{plate}/services",
            get(fleet::vehicle_services).post(fleet::add_service),
        )
        .route("/vehicles/{plate}/reminder", post(messages::maintenance_reminder))
        .route("/services", get(fleet::all_services))
        .route("/incidents", get(fleet::list_incidents).post(fleet::report_incident))
        .route("/incidents/{id}", patch(fleet::update_incident_status))
        .route(
            "/maintenance",
            get(maintenance::list_schedules).post(maintenance::create_schedule),
        )
        .route("/maintenance/reminders", get(messages::due_reminders))
        .route(
            "/maintenance/{id}",
            get(maintenance::get_schedule).patch(maintenance::update_schedule),
        )
        .route("/stats", get(fleet::stats))
        .route("/alerts/vtv", get(messages::vtv_alerts))
        .route("/messages", get(messages::inbox).post(messages::send_message))
        .route("/messages/{id}/read", post(messages::mark_read))
        .route("/account/password", post(accounts::change_own_password))
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/{username}/password", put(accounts::reset_password))
        .route("/backups", get(accounts::list_backups).post(accounts::create_backup))
        .route("/backups/export", post(accounts::export_csv));

    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::form_login))
        .route("/logout", post(auth::form_logout))
        .route("/home", get(auth::home_page))
        .nest("/api", api)
        .with_state(state)
}
