//! Local authentication: password hashing, the credential store and the
//! session gate.

pub mod credential_store;
pub mod password;
pub mod session;

pub use credential_store::CredentialStore;
pub use password::CredentialHasher;
pub use session::{Session, SessionGate, SessionId, SessionRegistry};
