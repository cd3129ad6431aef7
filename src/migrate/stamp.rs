use std::io;
use std::path::{Path, PathBuf};

/// Directory under the user config directory that holds our state.
pub const CONFIG_SUBDIR: &str = "toolbox";
pub const STAMP_FILE: &str = "podman-system-migrate";

/// `<config_dir>/toolbox/podman-system-migrate`
pub fn stamp_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_SUBDIR).join(STAMP_FILE)
}

/// Read the last migrated engine version.
///
/// A missing file, or one holding only whitespace, means nothing has been
/// migrated yet and yields `Ok(None)`.
pub fn read(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let version = contents.trim();
            if version.is_empty() {
                Ok(None)
            } else {
                Ok(Some(version.to_string()))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Record `version`, trimmed and newline-terminated.
pub fn write(path: &Path, version: &str) -> io::Result<()> {
    std::fs::write(path, format!("{}\n", version.trim()))
}
