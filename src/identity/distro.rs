use super::IdentityError;

/// Distributions with a known Toolbx image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Fedora,
    Rhel,
    Ubuntu,
    Arch,
}

impl Distro {
    pub const ALL: [Distro; 4] = [Distro::Fedora, Distro::Rhel, Distro::Ubuntu, Distro::Arch];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            Distro::Fedora => "fedora",
            Distro::Rhel => "rhel",
            Distro::Ubuntu => "ubuntu",
            Distro::Arch => "arch",
        }
    }

    /// Arch is rolling; every other distro needs a release to pick an image.
    pub fn needs_release(self) -> bool {
        !matches!(self, Distro::Arch)
    }

    /// Validate and normalize a release string.
    pub fn parse_release(self, release: &str) -> Result<String, IdentityError> {
        let release = release.trim();
        let invalid = |hint: &str| IdentityError::InvalidRelease {
            release: release.to_string(),
            hint: hint.to_string(),
        };

        match self {
            Distro::Fedora => {
                let release = release.strip_prefix('f').unwrap_or(release);
                if release == "rawhide" {
                    return Ok(release.to_string());
                }
                match release.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(n.to_string()),
                    _ => Err(invalid("The release must be a positive integer or 'rawhide'.")),
                }
            }
            Distro::Rhel => match release.split_once('.') {
                Some((major, minor))
                    if major.parse::<u32>().is_ok_and(|m| m > 0)
                        && minor.parse::<u32>().is_ok() =>
                {
                    Ok(release.to_string())
                }
                _ => Err(invalid("The release must be in the '<major>.<minor>' format.")),
            },
            Distro::Ubuntu => match release.split_once('.') {
                Some((year, month))
                    if year.len() == 2
                        && month.len() == 2
                        && year.parse::<u32>().is_ok()
                        && month.parse::<u32>().is_ok_and(|m| (1..=12).contains(&m)) =>
                {
                    Ok(release.to_string())
                }
                _ => Err(invalid("The release must be in the 'YY.MM' format.")),
            },
            Distro::Arch => match release {
                "" | "latest" | "rolling" => Ok("latest".to_string()),
                _ => Err(invalid("The release must be 'latest'.")),
            },
        }
    }

    /// Image reference for an already-validated release.
    pub fn image(self, release: &str) -> String {
        match self {
            Distro::Fedora => format!("registry.fedoraproject.org/fedora-toolbox:{release}"),
            Distro::Rhel => {
                let major = release.split('.').next().unwrap_or(release);
                format!("registry.access.redhat.com/ubi{major}/toolbox:{release}")
            }
            Distro::Ubuntu => format!("quay.io/toolbx/ubuntu-toolbox:{release}"),
            Distro::Arch => "quay.io/toolbx/arch-toolbox:latest".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for distro in Distro::ALL {
            assert_eq!(Distro::from_id(distro.id()), Some(distro));
        }
        assert_eq!(Distro::from_id("gentoo"), None);
    }

    #[test]
    fn fedora_releases() {
        assert_eq!(Distro::Fedora.parse_release("40").unwrap(), "40");
        assert_eq!(Distro::Fedora.parse_release("f39").unwrap(), "39");
        assert_eq!(Distro::Fedora.parse_release("rawhide").unwrap(), "rawhide");
        assert!(Distro::Fedora.parse_release("0").is_err());
        assert!(Distro::Fedora.parse_release("forty").is_err());
    }

    #[test]
    fn rhel_releases() {
        assert_eq!(Distro::Rhel.parse_release("9.4").unwrap(), "9.4");
        assert!(Distro::Rhel.parse_release("9").is_err());
        assert_eq!(
            Distro::Rhel.image("9.4"),
            "registry.access.redhat.com/ubi9/toolbox:9.4"
        );
    }

    #[test]
    fn ubuntu_releases() {
        assert_eq!(Distro::Ubuntu.parse_release("24.04").unwrap(), "24.04");
        assert!(Distro::Ubuntu.parse_release("2404").is_err());
        assert!(Distro::Ubuntu.parse_release("24.13").is_err());
    }

    #[test]
    fn arch_needs_no_release() {
        assert!(!Distro::Arch.needs_release());
        assert_eq!(Distro::Arch.parse_release("").unwrap(), "latest");
        assert_eq!(Distro::Arch.image("latest"), "quay.io/toolbx/arch-toolbox:latest");
    }
}
