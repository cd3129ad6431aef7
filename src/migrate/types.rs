use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::RuntimeDirError;
use crate::engine::EngineError;

/// What to do when the engine's own migration fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPolicy {
    /// Abort and leave the stamp untouched, so the next run retries.
    Strict,
    /// Log the failure and record the new version anyway.
    Lenient,
}

impl MigrationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPolicy::Strict => "strict",
            MigrationPolicy::Lenient => "lenient",
        }
    }
}

/// How to wait for the migration lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockWait {
    /// Block until the lock is free.
    #[default]
    Block,
    /// Fail immediately if another process holds the lock.
    Try,
}

/// Successful results of a migration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The stamped version equals the running engine version.
    Unchanged,
    /// The engine is not newer than the stamped version.
    NotNeeded,
    Migrated,
    /// The engine migration failed under [`MigrationPolicy::Lenient`]; the
    /// stamp was updated regardless.
    MigrateFailedIgnored,
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to get the user config directory")]
    ConfigDir,

    #[error("failed to create configuration directory {}", path.display())]
    CreateConfigDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    RuntimeDir(#[from] RuntimeDirError),

    #[error("failed to get the Podman version")]
    VersionQuery(#[source] EngineError),

    #[error("failed to create lock file {}", path.display())]
    LockCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to acquire lock on {}", path.display())]
    LockAcquire {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read migration stamp file {}", path.display())]
    StampRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to migrate containers")]
    Migrate(#[source] EngineError),

    #[error("failed to update Podman version in migration stamp file {}", path.display())]
    StampWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
