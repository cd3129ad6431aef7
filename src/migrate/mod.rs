// Migration coordinator: keeps Podman's storage migrated across engine upgrades.

mod coordinator;
mod lock;
pub mod stamp;
mod types;
pub mod version;

pub use coordinator::{Coordinator, LOCK_FILE, skip_reason};
pub use lock::FileLock;
pub use types::{LockWait, MigrationError, MigrationOutcome, MigrationPolicy};
