use std::path::{Path, PathBuf};

use crate::host::Host;

const DEFAULT_SHELL: &str = "/bin/bash";

/// Fields of `/etc/os-release` used to pick a default image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: Option<String>,
    pub version_id: Option<String>,
}

impl OsRelease {
    /// Read and parse `path`. Unreadable files yield an empty value.
    pub fn read(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .map(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    pub fn parse(contents: &str) -> Self {
        let mut release = Self::default();
        for line in contents.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if value.is_empty() {
                continue;
            }
            match key {
                "ID" => release.id = Some(value.to_string()),
                "VERSION_ID" => release.version_id = Some(value.to_string()),
                _ => {}
            }
        }
        release
    }
}

/// The user on whose behalf containers are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub user: Option<String>,
    pub uid: u32,
    pub gid: u32,
    pub home: Option<PathBuf>,
    pub shell: PathBuf,
}

impl HostIdentity {
    pub fn current(host: &impl Host) -> Self {
        let (uid, gid) = effective_ids();
        let user = host
            .env("USER")
            .or_else(|| host.env("LOGNAME"))
            .filter(|u| !u.is_empty());
        let home = host
            .env("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir);
        let shell = host
            .env("SHELL")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SHELL));

        Self {
            user,
            uid,
            gid,
            home,
            shell,
        }
    }
}

#[cfg(unix)]
fn effective_ids() -> (u32, u32) {
    // SAFETY: geteuid() and getegid() are simple POSIX getters that always succeed and have no side effects.
    let uid = unsafe { libc::geteuid() };
    let gid = unsafe { libc::getegid() };
    (uid, gid)
}

#[cfg(not(unix))]
fn effective_ids() -> (u32, u32) {
    (0, 0)
}
