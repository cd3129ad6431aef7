use tracing::debug;

use crate::config::Config;

use super::IdentityError;
use super::distro::Distro;
use super::host::OsRelease;
use super::names::{ContainerName, ImageRef};

/// Name-related command-line flags of `create`.
#[derive(Debug, Clone, Default)]
pub struct NameFlags {
    pub container: Option<String>,
    pub distro: Option<String>,
    pub image: Option<String>,
    pub release: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    pub container: ContainerName,
    pub image: ImageRef,
    pub release: Option<String>,
}

/// Turn flags, config and host facts into a validated container/image pair.
///
/// Precedence for each value is flag, then config, then host, then the
/// built-in default (Fedora).
pub fn resolve_names(
    flags: &NameFlags,
    config: &Config,
    host_os: &OsRelease,
) -> Result<ResolvedNames, IdentityError> {
    let flags = NameFlags {
        container: non_empty(&flags.container),
        distro: non_empty(&flags.distro),
        image: non_empty(&flags.image),
        release: non_empty(&flags.release),
    };

    if flags.image.is_some() {
        if flags.distro.is_some() {
            return Err(IdentityError::ImageConflict("distro"));
        }
        if flags.release.is_some() {
            return Err(IdentityError::ImageConflict("release"));
        }
    }

    let (image, release) = match &flags.image {
        Some(image) => (ImageRef::new(image.as_str())?, None),
        None => resolve_from_distro(&flags, config, host_os)?,
    };

    let container = match &flags.container {
        Some(name) => ContainerName::new(name.as_str())?,
        None => ContainerName::from_image(&image)?,
    };

    debug!(
        "Resolved container {container} from image {image} (release {})",
        release.as_deref().unwrap_or("-")
    );

    Ok(ResolvedNames {
        container,
        image,
        release,
    })
}

fn resolve_from_distro(
    flags: &NameFlags,
    config: &Config,
    host_os: &OsRelease,
) -> Result<(ImageRef, Option<String>), IdentityError> {
    let host_distro = host_os.id.as_deref().and_then(Distro::from_id);

    let distro = match flags.distro.as_deref().or(config.distro.as_deref()) {
        Some(id) => Distro::from_id(id).ok_or_else(|| IdentityError::InvalidDistro(id.to_string()))?,
        None => host_distro.unwrap_or(Distro::Fedora),
    };

    // The configured release goes with the configured distro, not with one
    // picked on the command line.
    let release = flags
        .release
        .clone()
        .or_else(|| {
            if flags.distro.is_none() {
                config.release.clone()
            } else {
                None
            }
        })
        .or_else(|| {
            if host_distro == Some(distro) {
                host_os.version_id.clone()
            } else {
                None
            }
        });

    let release = match release {
        Some(release) => distro.parse_release(&release)?,
        None if distro.needs_release() => {
            return Err(IdentityError::DistroWithoutRelease(distro.id().to_string()));
        }
        None => distro.parse_release("")?,
    };

    let image = match &config.image {
        Some(image) if flags.distro.is_none() && flags.release.is_none() => image.clone(),
        _ => distro.image(&release),
    };

    Ok((ImageRef::new(image)?, Some(release)))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
