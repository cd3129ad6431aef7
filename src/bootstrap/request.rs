use std::path::{Path, PathBuf};

use clap::Args;

use crate::host::Host;
use crate::identity::HostIdentity;
use crate::platform::PlatformProfile;

/// Arguments of the hidden `init-container` command.
///
/// Built on the host by the creation orchestrator, rendered with
/// [`BootstrapRequest::to_args`], and parsed back by clap inside the
/// container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct BootstrapRequest {
    /// Name of the user to set up
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub uid: u32,

    #[arg(long, default_value_t = 0)]
    pub gid: u32,

    #[arg(long)]
    pub home: Option<PathBuf>,

    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Make /home a symbolic link to /var/home
    #[arg(long)]
    pub home_link: bool,

    /// Make /media a symbolic link to /var/media
    #[arg(long)]
    pub media_link: bool,

    /// Make /mnt a symbolic link to /var/mnt
    #[arg(long)]
    pub mnt_link: bool,

    /// Track the host's /etc/hosts, /etc/resolv.conf and /etc/localtime
    #[arg(long)]
    pub monitor_host: bool,
}

impl BootstrapRequest {
    /// Request for `identity`, forwarding the host's link layout when the
    /// profile allows it.
    pub fn for_host(identity: &HostIdentity, profile: &PlatformProfile, host: &impl Host) -> Self {
        let linked = |path: &str| profile.forward_links && host.is_symlink(Path::new(path));
        Self {
            user: identity.user.clone(),
            uid: identity.uid,
            gid: identity.gid,
            home: identity.home.clone(),
            shell: Some(identity.shell.clone()),
            home_link: linked("/home"),
            media_link: linked("/media"),
            mnt_link: linked("/mnt"),
            monitor_host: profile.monitor_host,
        }
    }

    /// `init-container` followed by its flags, ready to append to a command
    /// line.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "init-container".to_string(),
            "--gid".into(),
            self.gid.to_string(),
        ];
        if let Some(home) = &self.home {
            args.extend(["--home".into(), home.display().to_string()]);
        }
        if let Some(shell) = &self.shell {
            args.extend(["--shell".into(), shell.display().to_string()]);
        }
        args.extend(["--uid".into(), self.uid.to_string()]);
        if let Some(user) = &self.user {
            args.extend(["--user".into(), user.clone()]);
        }

        for (set, flag) in [
            (self.home_link, "--home-link"),
            (self.media_link, "--media-link"),
            (self.mnt_link, "--mnt-link"),
            (self.monitor_host, "--monitor-host"),
        ] {
            if set {
                args.push(flag.into());
            }
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        request: BootstrapRequest,
    }

    fn ann() -> HostIdentity {
        HostIdentity {
            user: Some("ann".into()),
            uid: 1000,
            gid: 1000,
            home: Some(PathBuf::from("/home/ann")),
            shell: PathBuf::from("/bin/zsh"),
        }
    }

    #[test]
    fn renders_flags_in_order() {
        let req = BootstrapRequest {
            home_link: true,
            monitor_host: true,
            ..BootstrapRequest::for_host(&ann(), &PlatformProfile::MACOS, &FakeHost::default())
        };
        assert_eq!(
            req.to_args(),
            [
                "init-container",
                "--gid",
                "1000",
                "--home",
                "/home/ann",
                "--shell",
                "/bin/zsh",
                "--uid",
                "1000",
                "--user",
                "ann",
                "--home-link",
                "--monitor-host",
            ]
        );
    }

    #[test]
    fn links_follow_host_symlinks_on_linux() {
        let host = FakeHost::default().symlink("/home").symlink("/mnt");
        let req = BootstrapRequest::for_host(&ann(), &PlatformProfile::LINUX, &host);
        assert!(req.home_link);
        assert!(req.mnt_link);
        assert!(!req.media_link);
        assert!(req.monitor_host);
    }

    #[test]
    fn macos_never_forwards_links() {
        let host = FakeHost::default().symlink("/home");
        let req = BootstrapRequest::for_host(&ann(), &PlatformProfile::MACOS, &host);
        assert!(!req.home_link);
        assert!(!req.monitor_host);
    }

    #[test]
    fn rendered_args_parse_back() {
        let host = FakeHost::default().symlink("/media");
        let req = BootstrapRequest::for_host(&ann(), &PlatformProfile::LINUX, &host);
        let mut argv = vec!["toolbox".to_string()];
        argv.extend(req.to_args().into_iter().skip(1));
        let parsed = Harness::try_parse_from(argv).unwrap();
        assert_eq!(parsed.request, req);
    }
}
