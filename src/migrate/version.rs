use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric `major.minor.patch` part of an engine version string.
///
/// Pre-release and build suffixes (`-dev`, `+git`) are ignored, missing
/// components count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for EngineVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        let core = s.split(['-', '+']).next().unwrap_or_default();
        if core.is_empty() {
            return Err(format!("invalid version {s:?}"));
        }

        let mut parts = [0u64; 3];
        for (i, part) in core.split('.').enumerate() {
            if i >= parts.len() {
                break;
            }
            parts[i] = part
                .parse()
                .map_err(|_| format!("invalid version component {part:?} in {s:?}"))?;
        }

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
        })
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whether moving from `previous` to `current` needs a storage migration.
///
/// Only an upgrade does. Versions that cannot be parsed are assumed to need
/// one.
pub fn requires_migration(previous: &str, current: &str) -> bool {
    match (previous.parse::<EngineVersion>(), current.parse::<EngineVersion>()) {
        (Ok(previous), Ok(current)) => current > previous,
        _ => true,
    }
}
