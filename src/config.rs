//! Layered runtime configuration.
//!
//! Order of precedence (later wins):
//! 1. compiled defaults
//! 2. `flota.toml` (or the file named by `FLOTA_CONFIG`)
//! 3. `FLOTA_*` environment variables, `__` separating sections
//!    (e.g. `FLOTA_BASIC__PORT=5000`, `FLOTA_BOOTSTRAP__ADMIN_PASSWORD=...`)

use crate::error::FleetError;
use argon2::Params;
use axum_extra::extract::cookie::Key;
use base64::Engine;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "flota.toml";
pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub bootstrap: BootstrapConfig,
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: IpAddr,
    pub port: u16,
    pub loglevel: String,
    pub database_path: PathBuf,
    pub backup_dir: PathBuf,
    /// Base64 key material for the private session cookie (at least 64 bytes
    /// once decoded). A fresh key is generated per process when unset.
    pub cookie_secret: Option<String>,
    /// Drop the `Secure` attribute so the cookie works over plain
    /// `http://localhost`.
    pub insecure_cookie: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            loglevel: "info".to_string(),
            database_path: PathBuf::from("data/flota_vehicular.db"),
            backup_dir: PathBuf::from("backups"),
            cookie_secret: None,
            insecure_cookie: true,
        }
    }
}

/// Accounts written on first run when the credential store is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub user_username: String,
    pub user_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            user_username: "user".to_string(),
            user_password: "user123".to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn uses_default_passwords(&self) -> bool {
        let defaults = Self::default();
        self.admin_password == defaults.admin_password || self.user_password == defaults.user_password
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    pub fn params(&self) -> Result<Params, FleetError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| FleetError::PasswordHash(e.to_string()))
    }
}

impl Config {
    /// Load configuration from defaults, the TOML file and the environment.
    pub fn load() -> Result<Self, FleetError> {
        let path = std::env::var("FLOTA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(path).extract().map_err(Into::into)
    }

    pub fn figment(path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FLOTA_").split("__"))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.basic.listen_addr, self.basic.port)
    }

    pub fn cookie_key(&self) -> Result<Key, FleetError> {
        let Some(secret) = self.basic.cookie_secret.as_deref() else {
            return Ok(Key::generate());
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(secret.trim())
            .map_err(|e| FleetError::InvalidConfig(format!("cookie_secret is not base64: {e}")))?;
        Key::try_from(bytes.as_slice()).map_err(|_| {
            FleetError::InvalidConfig("cookie_secret must decode to at least 64 bytes".to_string())
        })
    }
}
