//! Platform capability profiles.
//!
//! Everything that differs between a Linux host and a macOS host (where
//! Podman runs inside a VM) is described here as data. The rest of the crate
//! receives one `&PlatformProfile`, selected once at startup, and never
//! branches on the operating system itself.

use std::path::{Path, PathBuf};

use crate::host::Host;
use crate::migrate::MigrationPolicy;

/// File present on hosts with the unified (v2) cgroup hierarchy.
const CGROUP2_CONTROLLERS: &str = "/sys/fs/cgroup/cgroup.controllers";

/// Condition under which a profile flag is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    CgroupsV2,
    /// Only for a non-root caller.
    Rootless,
    /// Only when the caller is root.
    Root,
}

/// A group of `podman create` arguments emitted together.
#[derive(Debug, Clone, Copy)]
pub struct ProfileFlag {
    pub args: &'static [&'static str],
    pub requires: Requirement,
}

/// A host path bind-mounted into the container when it exists on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostMount {
    pub source: &'static str,
    pub target: &'static str,
    pub options: &'static str,
}

impl HostMount {
    /// The `--volume` value, e.g. `/dev:/dev:rslave`.
    pub fn volume_arg(&self) -> String {
        volume_arg(Path::new(self.source), Path::new(self.target), self.options)
    }
}

pub fn volume_arg(source: &Path, target: &Path, options: &str) -> String {
    if options.is_empty() {
        format!("{}:{}", source.display(), target.display())
    } else {
        format!("{}:{}:{}", source.display(), target.display(), options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostnamePolicy {
    Fixed(&'static str),
    ContainerName,
}

/// How the cgroup version is obtained. macOS has no cgroups at all, so it
/// reports a fixed value instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupsProbe {
    Detect,
    Simulated(u8),
}

/// How subordinate ID ranges are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubidProbe {
    /// Look the user up in `/etc/subuid` and `/etc/subgid`.
    Files,
    /// No subordinate ID files exist; accept any regular user.
    Simulated { min_uid: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeLayout {
    /// `/run` for root, `$XDG_RUNTIME_DIR` (or `/run/user/<uid>`) otherwise.
    Run,
    /// `/var/run` for root, `~/Library/Caches` otherwise.
    LibraryCaches,
}

#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub hostname: HostnamePolicy,
    pub network: &'static str,
    pub flags: &'static [ProfileFlag],
    pub mounts: &'static [HostMount],
    /// Bind-mount the running executable at `/usr/bin/toolbox`.
    pub mount_executable: bool,
    /// Pass `--home-link`/`--media-link`/`--mnt-link` to the container when
    /// the host has the same paths as symbolic links.
    pub forward_links: bool,
    /// Ask the container to track host configuration (`--monitor-host`).
    pub monitor_host: bool,
    pub migration_policy: MigrationPolicy,
    pub cgroups: CgroupsProbe,
    pub subids: SubidProbe,
    pub runtime_layout: RuntimeLayout,
}

impl PlatformProfile {
    pub const LINUX: PlatformProfile = PlatformProfile {
        hostname: HostnamePolicy::Fixed("toolbx"),
        network: "host",
        flags: &[
            ProfileFlag {
                args: &["--privileged"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--security-opt", "label=disable"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--userns", "keep-id"],
                requires: Requirement::Rootless,
            },
            ProfileFlag {
                args: &["--userns", "host"],
                requires: Requirement::Root,
            },
            ProfileFlag {
                args: &["--ipc", "host"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--pid", "host"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--ulimit", "host"],
                requires: Requirement::CgroupsV2,
            },
        ],
        mounts: &[
            HostMount {
                source: "/",
                target: "/run/host",
                options: "rslave",
            },
            HostMount {
                source: "/dev",
                target: "/dev",
                options: "rslave",
            },
            HostMount {
                source: "/run/dbus/system_bus_socket",
                target: "/run/dbus/system_bus_socket",
                options: "",
            },
            HostMount {
                source: "/var/lib/flatpak",
                target: "/var/lib/flatpak",
                options: "ro",
            },
            HostMount {
                source: "/var/log/journal",
                target: "/var/log/journal",
                options: "ro",
            },
            HostMount {
                source: "/var/mnt",
                target: "/var/mnt",
                options: "rslave",
            },
        ],
        mount_executable: true,
        forward_links: true,
        monitor_host: true,
        migration_policy: MigrationPolicy::Strict,
        cgroups: CgroupsProbe::Detect,
        subids: SubidProbe::Files,
        runtime_layout: RuntimeLayout::Run,
    };

    pub const MACOS: PlatformProfile = PlatformProfile {
        hostname: HostnamePolicy::ContainerName,
        network: "slirp4netns",
        flags: &[
            ProfileFlag {
                args: &["--cap-add", "SYS_PTRACE"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--security-opt", "label=disable"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--ipc", "host"],
                requires: Requirement::Always,
            },
            ProfileFlag {
                args: &["--pid", "host"],
                requires: Requirement::Always,
            },
        ],
        mounts: &[
            HostMount {
                source: "/Users",
                target: "/host/Users",
                options: "rslave",
            },
            HostMount {
                source: "/Applications",
                target: "/host/Applications",
                options: "ro",
            },
            HostMount {
                source: "/opt",
                target: "/host/opt",
                options: "rslave",
            },
            HostMount {
                source: "/usr/local",
                target: "/host/usr/local",
                options: "rslave",
            },
            HostMount {
                source: "/tmp",
                target: "/host/tmp",
                options: "rslave",
            },
        ],
        // The host binary is a Mach-O executable and cannot run in the VM.
        mount_executable: false,
        forward_links: false,
        monitor_host: false,
        migration_policy: MigrationPolicy::Lenient,
        cgroups: CgroupsProbe::Simulated(1),
        subids: SubidProbe::Simulated { min_uid: 501 },
        runtime_layout: RuntimeLayout::LibraryCaches,
    };

    /// Profile for the operating system this binary was built for.
    pub fn current() -> &'static PlatformProfile {
        if cfg!(target_os = "macos") {
            &Self::MACOS
        } else {
            &Self::LINUX
        }
    }

    pub fn cgroups_version(&self, host: &impl Host) -> u8 {
        match self.cgroups {
            CgroupsProbe::Simulated(version) => version,
            CgroupsProbe::Detect => {
                if host.exists(Path::new(CGROUP2_CONTROLLERS)) {
                    2
                } else {
                    1
                }
            }
        }
    }

    pub fn hostname<'a>(&self, container: &'a str) -> &'a str {
        match self.hostname {
            HostnamePolicy::Fixed(name) => name,
            HostnamePolicy::ContainerName => container,
        }
    }

    /// Flags whose requirement holds on this host for the caller `uid`,
    /// flattened in table order.
    pub fn enabled_flags(&self, host: &impl Host, uid: u32) -> Vec<String> {
        let cgroups = self.cgroups_version(host);
        self.flags
            .iter()
            .filter(|flag| match flag.requires {
                Requirement::Always => true,
                Requirement::CgroupsV2 => cgroups >= 2,
                Requirement::Rootless => uid != 0,
                Requirement::Root => uid == 0,
            })
            .flat_map(|flag| flag.args.iter().map(|a| a.to_string()))
            .collect()
    }

    /// Directory under which the per-user `toolbox` runtime directory lives.
    ///
    /// Returns `None` when the layout needs a home directory and none is known.
    pub fn runtime_base(&self, uid: u32, home: Option<&Path>, host: &impl Host) -> Option<PathBuf> {
        match (self.runtime_layout, uid) {
            (RuntimeLayout::Run, 0) => Some(PathBuf::from("/run")),
            (RuntimeLayout::Run, uid) => Some(
                host.env("XDG_RUNTIME_DIR")
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(format!("/run/user/{uid}"))),
            ),
            (RuntimeLayout::LibraryCaches, 0) => Some(PathBuf::from("/var/run")),
            (RuntimeLayout::LibraryCaches, _) => {
                home.map(|home| home.join("Library").join("Caches"))
            }
        }
    }
}
