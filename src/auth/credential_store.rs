use crate::auth::password::CredentialHasher;
use crate::config::BootstrapConfig;
use crate::db::{AccountSummary, AccountsStorage, DbAccount, Role};
use crate::error::FleetError;
use crate::validators::validate_password;
use chrono::Utc;
use subtle::Choice;
use tracing::{debug, info, warn};

/// Username to (password hash, role) records backed by the `accounts` table.
#[derive(Clone)]
pub struct CredentialStore {
    accounts: AccountsStorage,
    hasher: CredentialHasher,
}

impl CredentialStore {
    pub fn new(accounts: AccountsStorage, hasher: CredentialHasher) -> Self {
        Self { accounts, hasher }
    }

    /// Create the administrator and regular accounts when the store is empty.
    /// Safe to call on every startup; returns whether accounts were written.
    pub async fn bootstrap(&self, defaults: &BootstrapConfig) -> Result<bool, FleetError> {
        if self.accounts.count().await? > 0 {
            debug!("credential store already populated; bootstrap skipped");
            return Ok(false);
        }

        if defaults.admin_username.trim().is_empty() || defaults.user_username.trim().is_empty() {
            return Err(FleetError::InvalidConfig(
                "bootstrap usernames must not be empty".to_string(),
            ));
        }
        if defaults.admin_username.trim() == defaults.user_username.trim() {
            return Err(FleetError::InvalidConfig(
                "bootstrap admin and user accounts must have different usernames".to_string(),
            ));
        }
        if defaults.admin_password.is_empty() || defaults.user_password.is_empty() {
            return Err(FleetError::InvalidConfig(
                "bootstrap passwords must not be empty".to_string(),
            ));
        }

        let seeds = [
            (&defaults.admin_username, &defaults.admin_password, Role::Admin),
            (&defaults.user_username, &defaults.user_password, Role::User),
        ];
        let now = Utc::now();
        let mut rows = Vec::with_capacity(seeds.len());
        for (username, password, role) in seeds {
            rows.push(DbAccount {
                username: username.trim().to_string(),
                password_hash: self.hash_blocking(password.clone()).await?,
                role,
                created_at: now,
            });
        }

        let written = self.accounts.insert_if_empty(rows).await?;
        if written {
            info!(
                admin = %defaults.admin_username,
                user = %defaults.user_username,
                "credential store bootstrapped"
            );
            if defaults.uses_default_passwords() {
                warn!("bootstrap used the shipped default passwords; change them with `flota set-password`");
            }
        }
        Ok(written)
    }

    /// Return the account's role when `password` matches, `None` otherwise.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Option<Role>, FleetError> {
        let account = self.accounts.get(username).await?;
        let hasher = self.hasher.clone();
        let password = password.to_string();

        let (found, role, matched) = tokio::task::spawn_blocking(move || match account {
            Some(acc) => {
                let matched = hasher.verify(&password, &acc.password_hash);
                (Choice::from(1), Some(acc.role), matched)
            }
            None => (Choice::from(0), None, hasher.verify_dummy(&password)),
        })
        .await
        .map_err(|e| FleetError::PasswordHash(format!("verification task failed: {e}")))?;

        if bool::from(found & matched) {
            Ok(role)
        } else {
            debug!(username, "credential mismatch");
            Ok(None)
        }
    }

    /// Replace an account's password with a fresh hash.
    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<(), FleetError> {
        validate_password(new_password)?;
        if !self.accounts.exists(username).await? {
            return Err(FleetError::NotFound(format!("account {username}")));
        }
        let hash = self.hash_blocking(new_password.to_string()).await?;
        if !self.accounts.set_password_hash(username, &hash).await? {
            return Err(FleetError::NotFound(format!("account {username}")));
        }
        info!(username, "password changed");
        Ok(())
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, FleetError> {
        Ok(self
            .accounts
            .list()
            .await?
            .into_iter()
            .map(AccountSummary::from)
            .collect())
    }

    async fn hash_blocking(&self, password: String) -> Result<String, FleetError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| FleetError::PasswordHash(format!("hashing task failed: {e}")))?
    }
}
