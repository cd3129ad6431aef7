use serde::{Deserialize, Serialize};

use crate::migrate::{LockWait, MigrationPolicy};

/// User settings read from `toolbox.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine binary to run.
    pub engine: String,
    pub distro: Option<String>,
    pub release: Option<String>,
    pub image: Option<String>,
    /// Overrides the platform profile's policy when set.
    pub migration_policy: Option<MigrationPolicy>,
    pub lock_wait: LockWait,
    /// Give up on the download confirmation after this many seconds.
    pub prompt_timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: "podman".to_string(),
            distro: None,
            release: None,
            image: None,
            migration_policy: None,
            lock_wait: LockWait::Block,
            prompt_timeout: None,
        }
    }
}
