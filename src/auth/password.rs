use crate::error::FleetError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::Choice;

/// Argon2id hashing with PHC-string output.
///
/// Holds a hash of a random throwaway secret so lookups of unknown usernames
/// can still run one full verification.
#[derive(Clone)]
pub struct CredentialHasher {
    argon: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialHasher {
    pub fn new(params: Params) -> Result<Self, FleetError> {
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut throwaway = [0u8; 32];
        OsRng.fill_bytes(&mut throwaway);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon.hash_password(&throwaway, &salt)?.to_string();

        Ok(Self { argon, dummy_hash })
    }

    pub fn hash(&self, password: &str) -> Result<String, FleetError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Check `password` against a stored PHC string. A malformed stored hash
    /// never matches.
    pub fn verify(&self, password: &str, phc: &str) -> Choice {
        let Ok(parsed) = PasswordHash::new(phc) else {
            return Choice::from(0);
        };
        let ok = self
            .argon
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        Choice::from(ok as u8)
    }

    /// Burn one verification against the throwaway hash. Always false.
    pub fn verify_dummy(&self, password: &str) -> Choice {
        let _ = self.verify(password, &self.dummy_hash);
        Choice::from(0)
    }
}
