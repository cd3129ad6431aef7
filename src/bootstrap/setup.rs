use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::host::{Host, is_inside_container};

use super::request::BootstrapRequest;

/// Marker locations, relative to the container root, in order of preference.
pub const MARKER_CANDIDATES: [&str; 2] = ["run/.toolboxenv", "tmp/.toolboxenv"];

const VAR_DIRS: [&str; 2] = ["var/log", "var/tmp"];

/// Host files followed by `--monitor-host`, relative to `etc`.
const MONITORED_FILES: [&str; 3] = ["hosts", "resolv.conf", "localtime"];

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("the init-container command must be run inside a container")]
    NotInContainer,

    #[error("failed to create an environment marker (tried {})", display_paths(tried))]
    Marker {
        tried: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// What [`ensure_symlink`] found at the link path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Created,
    Unchanged,
    Replaced,
    /// Something other than a symbolic link or an empty directory is
    /// there; it was left alone.
    Occupied,
}

/// Make `link` a symbolic link to `target`.
///
/// A link that already points at `target` is kept, a link pointing elsewhere
/// is replaced, and so is an empty directory. A non-empty directory is never
/// touched. Anything else at `link` is kept unless `replace_files` is set and
/// it is a regular file.
pub fn ensure_symlink(link: &Path, target: &Path, replace_files: bool) -> io::Result<LinkState> {
    let meta = match fs::symlink_metadata(link) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            symlink(target, link)?;
            return Ok(LinkState::Created);
        }
        Err(e) => return Err(e),
    };

    let file_type = meta.file_type();
    if file_type.is_dir() {
        match fs::remove_dir(link) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
                return Ok(LinkState::Occupied);
            }
            Err(e) => return Err(e),
        }
    } else if file_type.is_symlink() {
        if fs::read_link(link)? == target {
            return Ok(LinkState::Unchanged);
        }
        fs::remove_file(link)?;
    } else if replace_files && file_type.is_file() {
        fs::remove_file(link)?;
    } else {
        return Ok(LinkState::Occupied);
    }

    symlink(target, link)?;
    Ok(LinkState::Replaced)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}

/// One-time set-up of a freshly created container, run as its entry point.
///
/// All paths are resolved under `root`, which is `/` in production.
pub struct Bootstrapper<'a, H: Host> {
    root: PathBuf,
    host: &'a H,
}

impl<'a, H: Host> Bootstrapper<'a, H> {
    pub fn new(root: impl Into<PathBuf>, host: &'a H) -> Self {
        Self {
            root: root.into(),
            host,
        }
    }

    pub fn run(&self, req: &BootstrapRequest) -> Result<(), BootstrapError> {
        if !is_inside_container(self.host) {
            return Err(BootstrapError::NotInContainer);
        }

        self.create_marker()?;
        if let Some(user) = &req.user {
            self.check_user(user, req.uid);
        }
        for dir in VAR_DIRS {
            let path = self.root.join(dir);
            if let Err(e) = fs::create_dir_all(&path) {
                warn!("Failed to create {}: {e}", path.display());
            }
        }

        for (wanted, name) in [
            (req.home_link, "home"),
            (req.mnt_link, "mnt"),
            (req.media_link, "media"),
        ] {
            if wanted {
                self.redirect_dir(name);
            }
        }
        if req.monitor_host {
            self.follow_host_files();
        }

        debug!("Hostname is set by the engine at creation; nothing to configure");
        info!("Container initialized");
        Ok(())
    }

    fn create_marker(&self) -> Result<(), BootstrapError> {
        let candidates: Vec<PathBuf> = MARKER_CANDIDATES
            .iter()
            .map(|c| self.root.join(c))
            .collect();
        if let Some(existing) = candidates.iter().find(|p| p.exists()) {
            debug!("Environment marker {} already present", existing.display());
            return Ok(());
        }

        let mut last_error = None;
        for path in &candidates {
            match OpenOptions::new().write(true).create(true).open(path) {
                Ok(_) => {
                    debug!("Created environment marker {}", path.display());
                    return Ok(());
                }
                Err(e) => {
                    debug!("Failed to create {}: {e}", path.display());
                    last_error = Some(e);
                }
            }
        }
        Err(BootstrapError::Marker {
            tried: candidates,
            source: last_error.unwrap_or_else(|| io::ErrorKind::NotFound.into()),
        })
    }

    /// Look `user` up in the container's passwd database. Mismatches are
    /// only reported.
    fn check_user(&self, user: &str, uid: u32) {
        let passwd = self.root.join("etc/passwd");
        let contents = match fs::read_to_string(&passwd) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read {}: {e}", passwd.display());
                return;
            }
        };

        let entry = contents
            .lines()
            .map(|line| line.split(':').collect::<Vec<_>>())
            .find(|fields| fields.first() == Some(&user));
        match entry.and_then(|fields| fields.get(2).map(|f| f.parse::<u32>())) {
            None => warn!("User {user} not found in {}", passwd.display()),
            Some(Ok(found)) if found == uid => debug!("User {user} has uid {uid}"),
            Some(Ok(found)) => warn!("User {user} has uid {found} in the container, expected {uid}"),
            Some(Err(_)) => warn!("User {user} has a malformed entry in {}", passwd.display()),
        }
    }

    /// Point `/<name>` at `var/<name>`.
    fn redirect_dir(&self, name: &str) {
        let target = Path::new("var").join(name);
        if let Err(e) = fs::create_dir_all(self.root.join(&target)) {
            warn!("Failed to create /{}: {e}", target.display());
            return;
        }
        self.link(&self.root.join(name), &target, false);
    }

    fn follow_host_files(&self) {
        for name in MONITORED_FILES {
            let host_copy = Path::new("run/host/etc").join(name);
            if !self.root.join(&host_copy).exists() {
                debug!("Host file /{} not found, skipping", host_copy.display());
                continue;
            }
            let target = Path::new("..").join(&host_copy);
            self.link(&self.root.join("etc").join(name), &target, true);
        }
    }

    fn link(&self, link: &Path, target: &Path, replace_files: bool) {
        match ensure_symlink(link, target, replace_files) {
            Ok(LinkState::Occupied) => {
                warn!(
                    "{} exists and is not a symbolic link, leaving it alone",
                    link.display()
                );
            }
            Ok(state) => debug!("{} -> {}: {state:?}", link.display(), target.display()),
            Err(e) => warn!("Failed to link {}: {e}", link.display()),
        }
    }
}

/// Keep the entry process alive after a successful bootstrap.
pub fn park_forever() -> ! {
    loop {
        std::thread::park();
    }
}
