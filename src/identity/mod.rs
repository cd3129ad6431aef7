// Identity resolution: who the container is for and which image it runs.

mod distro;
mod host;
mod names;
mod resolve;
mod subid;

use std::io;
use std::path::PathBuf;

pub use distro::Distro;
pub use host::{HostIdentity, OsRelease};
pub use names::{ContainerName, ImageRef};
pub use resolve::{NameFlags, ResolvedNames, resolve_names};
pub use subid::validate_subid_ranges;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("container name must not be empty")]
    EmptyContainerName,

    #[error("image must not be empty")]
    EmptyImage,

    #[error(
        "invalid container name {0}: it must start with a letter or digit and contain only \
         letters, digits, '_', '.' and '-'"
    )]
    InvalidContainer(String),

    #[error("invalid image {0}: it has no basename")]
    ImageWithoutBasename(String),

    #[error("distro {0} is unsupported")]
    InvalidDistro(String),

    #[error("distro {0} requires a release")]
    DistroWithoutRelease(String),

    #[error("invalid release {release}: {hint}")]
    InvalidRelease { release: String, hint: String },

    #[error("options --image and --{0} cannot be used together")]
    ImageConflict(&'static str),

    #[error("{0}")]
    UnsupportedUser(String),

    #[error("user {user} has no subordinate {kind} range in {}", path.display())]
    MissingSubids {
        user: String,
        kind: &'static str,
        path: PathBuf,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
