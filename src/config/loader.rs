use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::types::Config;

pub const CONFIG_FILE: &str = "toolbox.yaml";

/// `<config_dir>/containers/toolbox.yaml`
pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("containers").join(CONFIG_FILE)
}

/// Load config from `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}
