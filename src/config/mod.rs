// Configuration: optional per-user defaults for names, engine and migration.

mod loader;
mod types;

pub use loader::{CONFIG_FILE, config_path, load};
pub use types::Config;
