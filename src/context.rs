//! Per-invocation state.
//!
//! Everything that would otherwise be a process-wide cache lives on
//! [`Context`], which `main` builds once and passes down explicitly.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::host::Host;
use crate::identity::HostIdentity;
use crate::migrate::MigrationPolicy;
use crate::platform::PlatformProfile;

const RUNTIME_SUBDIR: &str = "toolbox";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeDirError {
    #[error("user home directory not found")]
    NoHome,

    #[error("failed to create runtime directory {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to change ownership of the runtime directory {}", path.display())]
    Chown {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Runtime directories already created during this invocation, by uid.
#[derive(Debug, Default)]
pub struct RuntimeDirs {
    dirs: HashMap<u32, PathBuf>,
}

impl RuntimeDirs {
    /// The `toolbox` runtime directory for `uid`, created with mode 0700 and
    /// owned by `uid:gid` on first use.
    pub fn resolve(
        &mut self,
        profile: &PlatformProfile,
        identity: &HostIdentity,
        host: &impl Host,
    ) -> Result<PathBuf, RuntimeDirError> {
        if let Some(dir) = self.dirs.get(&identity.uid) {
            return Ok(dir.clone());
        }

        let base = profile
            .runtime_base(identity.uid, identity.home.as_deref(), host)
            .ok_or(RuntimeDirError::NoHome)?;
        let dir = base.join(RUNTIME_SUBDIR);
        debug!("Creating runtime directory {}", dir.display());
        create_private_dir(&dir, identity.uid, identity.gid)?;

        self.dirs.insert(identity.uid, dir.clone());
        Ok(dir)
    }

    pub fn cached(&self, uid: u32) -> Option<&Path> {
        self.dirs.get(&uid).map(PathBuf::as_path)
    }
}

fn create_private_dir(dir: &Path, uid: u32, gid: u32) -> Result<(), RuntimeDirError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .map_err(|source| RuntimeDirError::Create {
            path: dir.to_path_buf(),
            source,
        })?;

    #[cfg(unix)]
    std::os::unix::fs::chown(dir, Some(uid), Some(gid)).map_err(|source| {
        RuntimeDirError::Chown {
            path: dir.to_path_buf(),
            source,
        }
    })?;
    #[cfg(not(unix))]
    let _ = (uid, gid);

    Ok(())
}

/// State shared by the commands of a single invocation.
#[derive(Debug)]
pub struct Context {
    pub profile: &'static PlatformProfile,
    pub config: Config,
    pub identity: HostIdentity,
    config_dir: Option<PathBuf>,
    runtime_dirs: RuntimeDirs,
}

impl Context {
    pub fn new(
        profile: &'static PlatformProfile,
        config: Config,
        identity: HostIdentity,
        config_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            profile,
            config,
            identity,
            config_dir,
            runtime_dirs: RuntimeDirs::default(),
        }
    }

    /// The per-user configuration directory (`~/.config` on Linux).
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir.clone()
    }

    /// Runtime directory of the invoking user.
    pub fn runtime_dir(&mut self, host: &impl Host) -> Result<PathBuf, RuntimeDirError> {
        self.runtime_dirs.resolve(self.profile, &self.identity, host)
    }

    /// The config file's choice, else the platform's.
    pub fn migration_policy(&self) -> MigrationPolicy {
        self.config
            .migration_policy
            .unwrap_or(self.profile.migration_policy)
    }
}
