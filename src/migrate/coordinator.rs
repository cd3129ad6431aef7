use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::Context;
use crate::engine::Engine;
use crate::host::Host;

use super::lock::FileLock;
use super::stamp;
use super::types::{LockWait, MigrationError, MigrationOutcome, MigrationPolicy};
use super::version::requires_migration;

/// Lock file name inside the per-user runtime directory.
pub const LOCK_FILE: &str = "migrate.lock";

/// Commands that never need the engine's storage to be migrated first.
const SKIP_COMMANDS: [&str; 2] = ["completion", "init-container"];

/// Why the pre-flight migration should not run for `command`, if it shouldn't.
pub fn skip_reason(command: &str, inside_container: bool) -> Option<String> {
    if inside_container {
        return Some("running inside a container".to_string());
    }
    if SKIP_COMMANDS.contains(&command) {
        return Some(format!("command {command} doesn't need it"));
    }
    None
}

/// Runs `podman system migrate` at most once per engine version change.
///
/// The last migrated version is kept in a stamp file; attempts from separate
/// processes are serialized with an exclusive lock in the runtime directory.
pub struct Coordinator<'a, E: Engine + ?Sized> {
    engine: &'a E,
    stamp_path: PathBuf,
    lock_path: PathBuf,
    policy: MigrationPolicy,
    wait: LockWait,
}

impl<'a, E: Engine + ?Sized> Coordinator<'a, E> {
    pub fn new(engine: &'a E, stamp_path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            engine,
            stamp_path,
            lock_path,
            policy: MigrationPolicy::Strict,
            wait: LockWait::Block,
        }
    }

    /// Build a coordinator from the invocation context: stamp under the user
    /// config directory, lock under the runtime directory, policy and lock
    /// behaviour from the profile and config.
    pub fn for_context(
        engine: &'a E,
        ctx: &mut Context,
        host: &impl Host,
    ) -> Result<Self, MigrationError> {
        let config_dir = ctx.config_dir().ok_or(MigrationError::ConfigDir)?;
        let runtime_dir = ctx.runtime_dir(host)?;
        Ok(Self::new(
            engine,
            stamp::stamp_path(&config_dir),
            runtime_dir.join(LOCK_FILE),
        )
        .with_policy(ctx.migration_policy())
        .with_lock_wait(ctx.config.lock_wait))
    }

    pub fn with_policy(mut self, policy: MigrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_lock_wait(mut self, wait: LockWait) -> Self {
        self.wait = wait;
        self
    }

    pub fn stamp_path(&self) -> &Path {
        &self.stamp_path
    }

    pub fn migrate(&self) -> Result<MigrationOutcome, MigrationError> {
        debug!("Migrating to newer Podman ({} policy)", self.policy.as_str());

        if let Some(dir) = self.stamp_path.parent() {
            debug!("Toolbx config directory is {}", dir.display());
            create_config_dir(dir)?;
        }

        let current = self
            .engine
            .version()
            .map_err(MigrationError::VersionQuery)?;
        debug!("Current Podman version is {current}");

        // Held until this function returns, on every path.
        let _lock = FileLock::acquire(&self.lock_path, self.wait)?;

        let previous =
            stamp::read(&self.stamp_path).map_err(|source| MigrationError::StampRead {
                path: self.stamp_path.clone(),
                source,
            })?;

        if let Some(previous) = previous {
            debug!("Old Podman version is {previous}");

            if previous == current {
                debug!("Migration not needed: Podman version {current} is unchanged");
                return Ok(MigrationOutcome::Unchanged);
            }

            if !requires_migration(&previous, &current) {
                debug!("Migration not needed: Podman version {current} is older than {previous}");
                return Ok(MigrationOutcome::NotNeeded);
            }
        }

        let outcome = match self.engine.system_migrate(None) {
            Ok(()) => {
                debug!("Migration to Podman version {current} was ok");
                MigrationOutcome::Migrated
            }
            Err(e) => match self.policy {
                MigrationPolicy::Strict => return Err(MigrationError::Migrate(e)),
                MigrationPolicy::Lenient => {
                    debug!("Podman system migrate failed, continuing: {e}");
                    MigrationOutcome::MigrateFailedIgnored
                }
            },
        };

        debug!("Updating Podman version in {}", self.stamp_path.display());
        stamp::write(&self.stamp_path, &current).map_err(|source| MigrationError::StampWrite {
            path: self.stamp_path.clone(),
            source,
        })?;

        Ok(outcome)
    }
}

fn create_config_dir(dir: &Path) -> Result<(), MigrationError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o775);
    }
    builder
        .create(dir)
        .map_err(|source| MigrationError::CreateConfigDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::engine::EngineError;

    struct StubEngine {
        version: RefCell<Result<String, String>>,
        migrate_fails: bool,
        migrations: Cell<usize>,
    }

    impl StubEngine {
        fn at(version: &str) -> Self {
            Self {
                version: RefCell::new(Ok(version.to_string())),
                migrate_fails: false,
                migrations: Cell::new(0),
            }
        }

        fn failing_migrate(mut self) -> Self {
            self.migrate_fails = true;
            self
        }

        fn set_version(&self, version: &str) {
            *self.version.borrow_mut() = Ok(version.to_string());
        }
    }

    fn failure(what: &str) -> EngineError {
        EngineError::Failed {
            command: format!("podman {what}"),
            status: "exit status: 125".into(),
            detail: String::new(),
        }
    }

    impl Engine for StubEngine {
        fn container_exists(&self, _: &str) -> Result<bool, EngineError> {
            unreachable!()
        }
        fn image_exists(&self, _: &str) -> Result<bool, EngineError> {
            unreachable!()
        }
        fn is_toolbox_image(&self, _: &str) -> Result<bool, EngineError> {
            unreachable!()
        }
        fn image_size(&self, _: &str) -> Result<u64, EngineError> {
            unreachable!()
        }
        fn pull(&self, _: &str, _: Option<&Path>) -> Result<(), EngineError> {
            unreachable!()
        }
        fn version(&self) -> Result<String, EngineError> {
            self.version.borrow().clone().map_err(|w| failure(&w))
        }
        fn system_migrate(&self, _: Option<&str>) -> Result<(), EngineError> {
            self.migrations.set(self.migrations.get() + 1);
            if self.migrate_fails {
                Err(failure("system migrate"))
            } else {
                Ok(())
            }
        }
        fn invoke(&self, _: &[String]) -> Result<(), EngineError> {
            unreachable!()
        }
    }

    fn coordinator<'a>(engine: &'a StubEngine, dir: &Path) -> Coordinator<'a, StubEngine> {
        Coordinator::new(
            engine,
            stamp::stamp_path(&dir.join("config")),
            dir.join(LOCK_FILE),
        )
    }

    #[test]
    fn first_run_migrates_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2");
        let c = coordinator(&engine, dir.path());

        assert_eq!(c.migrate().unwrap(), MigrationOutcome::Migrated);
        assert_eq!(engine.migrations.get(), 1);
        assert_eq!(stamp::read(c.stamp_path()).unwrap().as_deref(), Some("4.9.2"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2");
        let c = coordinator(&engine, dir.path());

        c.migrate().unwrap();
        assert_eq!(c.migrate().unwrap(), MigrationOutcome::Unchanged);
        assert_eq!(engine.migrations.get(), 1);
    }

    #[test]
    fn upgrade_migrates_again() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2");
        let c = coordinator(&engine, dir.path());
        c.migrate().unwrap();

        engine.set_version("5.0.1");
        assert_eq!(c.migrate().unwrap(), MigrationOutcome::Migrated);
        assert_eq!(engine.migrations.get(), 2);
        assert_eq!(stamp::read(c.stamp_path()).unwrap().as_deref(), Some("5.0.1"));
    }

    #[test]
    fn downgrade_skips_migration_and_keeps_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("5.0.1");
        let c = coordinator(&engine, dir.path());
        c.migrate().unwrap();

        engine.set_version("4.9.2");
        assert_eq!(c.migrate().unwrap(), MigrationOutcome::NotNeeded);
        assert_eq!(engine.migrations.get(), 1);
        assert_eq!(stamp::read(c.stamp_path()).unwrap().as_deref(), Some("5.0.1"));
    }

    #[test]
    fn strict_failure_leaves_stamp_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2").failing_migrate();
        let c = coordinator(&engine, dir.path());

        assert!(matches!(c.migrate(), Err(MigrationError::Migrate(_))));
        assert_eq!(stamp::read(c.stamp_path()).unwrap(), None);
        // Retried on the next run.
        assert!(c.migrate().is_err());
        assert_eq!(engine.migrations.get(), 2);
    }

    #[test]
    fn lenient_failure_still_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2").failing_migrate();
        let c = coordinator(&engine, dir.path()).with_policy(MigrationPolicy::Lenient);

        assert_eq!(c.migrate().unwrap(), MigrationOutcome::MigrateFailedIgnored);
        assert_eq!(stamp::read(c.stamp_path()).unwrap().as_deref(), Some("4.9.2"));
        assert_eq!(c.migrate().unwrap(), MigrationOutcome::Unchanged);
    }

    #[test]
    fn version_failure_is_fatal_before_locking() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2");
        *engine.version.borrow_mut() = Err("version".into());
        let c = coordinator(&engine, dir.path());

        assert!(matches!(c.migrate(), Err(MigrationError::VersionQuery(_))));
        assert!(!dir.path().join(LOCK_FILE).exists());
        assert_eq!(engine.migrations.get(), 0);
    }

    #[test]
    fn unreadable_stamp_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let engine = StubEngine::at("4.9.2");
        let c = coordinator(&engine, dir.path());
        std::fs::create_dir_all(c.stamp_path()).unwrap();

        assert!(matches!(c.migrate(), Err(MigrationError::StampRead { .. })));
        assert_eq!(engine.migrations.get(), 0);
    }

    #[test]
    fn skip_reasons() {
        assert!(skip_reason("create", true).is_some());
        assert!(skip_reason("completion", false).is_some());
        assert!(skip_reason("init-container", false).is_some());
        assert!(skip_reason("create", false).is_none());
    }
}
