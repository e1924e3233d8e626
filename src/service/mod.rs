pub mod backup;
pub mod fleet;
pub mod messaging;

pub use backup::{BackupInfo, BackupManager, TableExport};
pub use fleet::FleetOps;
pub use messaging::Messaging;
