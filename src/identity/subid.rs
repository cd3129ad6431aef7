use std::path::Path;

use tracing::debug;

use crate::platform::{PlatformProfile, SubidProbe};

use super::IdentityError;
use super::host::HostIdentity;

/// Check that `identity` may run rootless containers: it needs subordinate
/// uid and gid ranges. `etc` is the directory holding `subuid`/`subgid`.
pub fn validate_subid_ranges(
    profile: &PlatformProfile,
    identity: &HostIdentity,
    etc: &Path,
) -> Result<(), IdentityError> {
    let user = identity.user.as_deref().unwrap_or_default();
    if user == "ALL" {
        return Err(IdentityError::UnsupportedUser(
            "username ALL not supported".to_string(),
        ));
    }

    match profile.subids {
        SubidProbe::Simulated { min_uid } => {
            if identity.uid == 0 {
                return Err(IdentityError::UnsupportedUser(
                    "root user not supported for containers on this platform".to_string(),
                ));
            }
            if identity.uid < min_uid {
                return Err(IdentityError::UnsupportedUser(
                    "system user not supported for containers".to_string(),
                ));
            }
            debug!(
                "Simulating subordinate ID validation for user {user} (UID: {})",
                identity.uid
            );
            Ok(())
        }
        SubidProbe::Files => {
            if identity.uid == 0 {
                return Ok(());
            }
            for (file, kind) in [("subuid", "UID"), ("subgid", "GID")] {
                let path = etc.join(file);
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| IdentityError::Read {
                        path: path.clone(),
                        source,
                    })?;
                if !has_range(&contents, user, identity.uid) {
                    return Err(IdentityError::MissingSubids {
                        user: user.to_string(),
                        kind,
                        path,
                    });
                }
            }
            Ok(())
        }
    }
}

/// Whether an `owner:start:count` file has a non-empty range for the user.
fn has_range(contents: &str, user: &str, uid: u32) -> bool {
    let uid = uid.to_string();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split(':');
            let owner = fields.next()?;
            let _start: u64 = fields.next()?.parse().ok()?;
            let count: u64 = fields.next()?.parse().ok()?;
            Some((owner, count))
        })
        .any(|(owner, count)| count > 0 && ((!user.is_empty() && owner == user) || owner == uid))
}
