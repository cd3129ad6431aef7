use std::path::Path;

use crate::bootstrap::BootstrapRequest;
use crate::host::Host;
use crate::identity::HostIdentity;
use crate::platform::{PlatformProfile, volume_arg};

use super::types::ContainerSpec;

pub const TOOLBOX_LABEL: &str = "com.github.containers.toolbox=true";

/// Host locations of the shell profile script, first match wins.
pub const PROFILE_SCRIPT_SOURCES: [&str; 2] =
    ["/etc/profile.d/toolbox.sh", "/usr/share/profile.d/toolbox.sh"];
pub const PROFILE_SCRIPT_TARGET: &str = "/etc/profile.d/toolbox.sh";

pub const EXECUTABLE_TARGET: &str = "/usr/bin/toolbox";

/// Inputs to argument assembly that do not depend on the container.
#[derive(Debug, Clone)]
pub struct Assembly<'a> {
    pub profile: &'a PlatformProfile,
    pub identity: &'a HostIdentity,
    /// `--log-level` passed to the engine itself.
    pub engine_log_level: &'a str,
    /// `--log-level` passed to `init-container` inside the container.
    pub toolbox_log_level: &'a str,
    /// The running executable, mounted into the container when the profile
    /// allows it.
    pub executable: Option<&'a Path>,
}

/// Engine arguments for `podman create`, from `--log-level` to the last
/// `init-container` flag.
///
/// Only host paths that exist right now are mounted, so the result depends
/// on `host` as well as on `spec` and `assembly`.
pub fn create_args(spec: &ContainerSpec, host: &impl Host, assembly: &Assembly<'_>) -> Vec<String> {
    let profile = assembly.profile;
    let name = spec.name.as_str();

    let mut args: Vec<String> = vec![
        "--log-level".into(),
        assembly.engine_log_level.into(),
        "create".into(),
        "--dns".into(),
        "none".into(),
        "--hostname".into(),
        profile.hostname(name).into(),
        "--interactive".into(),
        "--label".into(),
        TOOLBOX_LABEL.into(),
        "--name".into(),
        name.into(),
        "--network".into(),
        profile.network.into(),
        "--tty".into(),
        "--user".into(),
        "root:root".into(),
    ];
    args.extend(profile.enabled_flags(host, assembly.identity.uid));

    let mut volume = |value: String| args.extend(["--volume".to_string(), value]);

    if let Some(home) = &assembly.identity.home {
        volume(volume_arg(home, home, "rslave"));
    }
    for mount in profile.mounts {
        if host.exists(Path::new(mount.source)) {
            volume(mount.volume_arg());
        }
    }
    if let Some(script) = PROFILE_SCRIPT_SOURCES
        .iter()
        .map(Path::new)
        .find(|p| host.exists(p))
    {
        volume(volume_arg(script, Path::new(PROFILE_SCRIPT_TARGET), "ro"));
    }
    if profile.mount_executable
        && let Some(exe) = assembly.executable
    {
        volume(volume_arg(exe, Path::new(EXECUTABLE_TARGET), "ro"));
    }

    args.push(spec.image.as_str().into());

    let request = BootstrapRequest::for_host(assembly.identity, profile, host);
    args.extend([
        "toolbox".to_string(),
        "--log-level".into(),
        assembly.toolbox_log_level.into(),
    ]);
    args.extend(request.to_args());
    args
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::host::fake::FakeHost;
    use crate::identity::{ContainerName, ImageRef};

    fn spec() -> ContainerSpec {
        ContainerSpec {
            name: ContainerName::new("dev").unwrap(),
            image: ImageRef::new("registry.fedoraproject.org/fedora-toolbox:40").unwrap(),
            release: Some("40".into()),
            auth_file: None,
        }
    }

    fn ann() -> HostIdentity {
        HostIdentity {
            user: Some("ann".into()),
            uid: 1000,
            gid: 1000,
            home: Some(PathBuf::from("/home/ann")),
            shell: PathBuf::from("/bin/bash"),
        }
    }

    fn assembly<'a>(profile: &'a PlatformProfile, identity: &'a HostIdentity) -> Assembly<'a> {
        Assembly {
            profile,
            identity,
            engine_log_level: "error",
            toolbox_log_level: "warn",
            executable: Some(Path::new("/usr/local/bin/toolbox")),
        }
    }

    fn has_volume(args: &[String], value: &str) -> bool {
        args.windows(2).any(|w| w[0] == "--volume" && w[1] == value)
    }

    #[test]
    fn starts_with_engine_log_level_and_create() {
        let identity = ann();
        let args = create_args(
            &spec(),
            &FakeHost::default(),
            &assembly(&PlatformProfile::LINUX, &identity),
        );
        assert_eq!(&args[..3], ["--log-level", "error", "create"]);
        assert!(args.windows(2).any(|w| w == ["--name", "dev"]));
        assert!(args.windows(2).any(|w| w == ["--label", TOOLBOX_LABEL]));
        assert!(args.windows(2).any(|w| w == ["--hostname", "toolbx"]));
    }

    #[test]
    fn root_caller_shares_the_host_user_namespace() {
        let identity = HostIdentity {
            user: Some("root".into()),
            uid: 0,
            gid: 0,
            home: Some(PathBuf::from("/root")),
            shell: PathBuf::from("/bin/bash"),
        };
        let args = create_args(
            &spec(),
            &FakeHost::default(),
            &assembly(&PlatformProfile::LINUX, &identity),
        );

        assert!(args.windows(2).any(|w| w == ["--userns", "host"]));
        assert!(!args.iter().any(|a| a == "keep-id"));
    }

    #[test]
    fn regular_caller_keeps_its_id() {
        let identity = ann();
        let args = create_args(
            &spec(),
            &FakeHost::default(),
            &assembly(&PlatformProfile::LINUX, &identity),
        );
        assert!(args.windows(2).any(|w| w == ["--userns", "keep-id"]));
    }

    #[test]
    fn macos_mounts_only_existing_paths() {
        let identity = ann();
        let host = FakeHost::with_paths(&["/Users"]);
        let args = create_args(&spec(), &host, &assembly(&PlatformProfile::MACOS, &identity));

        assert!(has_volume(&args, "/Users:/host/Users:rslave"));
        assert!(!args.iter().any(|a| a.starts_with("/opt:")));
        assert!(args.windows(2).any(|w| w == ["--hostname", "dev"]));
    }

    #[test]
    fn home_is_always_mounted() {
        let identity = ann();
        let args = create_args(
            &spec(),
            &FakeHost::default(),
            &assembly(&PlatformProfile::MACOS, &identity),
        );
        assert!(has_volume(&args, "/home/ann:/home/ann:rslave"));
    }

    #[test]
    fn executable_mount_follows_profile() {
        let identity = ann();
        let host = FakeHost::default();
        let linux = create_args(&spec(), &host, &assembly(&PlatformProfile::LINUX, &identity));
        let macos = create_args(&spec(), &host, &assembly(&PlatformProfile::MACOS, &identity));

        assert!(has_volume(&linux, "/usr/local/bin/toolbox:/usr/bin/toolbox:ro"));
        assert!(!macos.iter().any(|a| a.ends_with(":/usr/bin/toolbox:ro")));
    }

    #[test]
    fn first_profile_script_wins() {
        let identity = ann();
        let host = FakeHost::with_paths(&PROFILE_SCRIPT_SOURCES);
        let args = create_args(&spec(), &host, &assembly(&PlatformProfile::LINUX, &identity));
        assert!(has_volume(
            &args,
            "/etc/profile.d/toolbox.sh:/etc/profile.d/toolbox.sh:ro"
        ));
        assert!(!args.iter().any(|a| a.starts_with("/usr/share/profile.d")));
    }

    #[test]
    fn ends_with_image_and_bootstrap_command() {
        let identity = ann();
        let host = FakeHost::default().symlink("/home");
        let args = create_args(&spec(), &host, &assembly(&PlatformProfile::LINUX, &identity));

        let image = args
            .iter()
            .position(|a| a == "registry.fedoraproject.org/fedora-toolbox:40")
            .unwrap();
        assert_eq!(
            &args[image + 1..],
            [
                "toolbox",
                "--log-level",
                "warn",
                "init-container",
                "--gid",
                "1000",
                "--home",
                "/home/ann",
                "--shell",
                "/bin/bash",
                "--uid",
                "1000",
                "--user",
                "ann",
                "--home-link",
                "--monitor-host",
            ]
        );
    }
}
