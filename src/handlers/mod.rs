pub mod accounts;
pub mod auth;
pub mod fleet;
pub mod maintenance;
pub mod messages;
