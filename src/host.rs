// Host probing: the filesystem and environment facts that steer decisions.

use std::path::Path;

/// Files whose presence means we are running inside some container.
const CONTAINER_ENV_FILES: [&str; 2] = ["/.dockerenv", "/run/.containerenv"];

/// Read-only view of the machine we are running on.
///
/// Argument assembly and container detection only look at the host through
/// this trait, so tests can describe a host without touching the real one.
pub trait Host {
    fn exists(&self, path: &Path) -> bool;

    /// True for a symbolic link, whether or not its target exists.
    fn is_symlink(&self, path: &Path) -> bool;

    fn env(&self, key: &str) -> Option<String>;
}

/// The machine this process runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Whether this process runs inside a container (any engine, not only ours).
pub fn is_inside_container(host: &impl Host) -> bool {
    if host.env("container").is_some() {
        return true;
    }
    CONTAINER_ENV_FILES
        .iter()
        .any(|path| host.exists(Path::new(path)))
}
