pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod validators;

pub use error::FleetError;
pub use router::{FleetState, fleet_router};
