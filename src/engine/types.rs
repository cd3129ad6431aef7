use std::collections::HashMap;
use std::io;

use serde::Deserialize;

/// Labels that mark an image as a Toolbx base image.
pub const TOOLBOX_LABELS: [&str; 2] = [
    "com.github.containers.toolbox",
    "com.github.debarshiray.toolbox",
];

/// Failure reported by the engine proxy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to invoke `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The command ran but exited unsuccessfully. `detail` is empty or
    /// starts with `": "` followed by the captured stderr.
    #[error("`{command}` failed with {status}{detail}")]
    Failed {
        command: String,
        status: String,
        detail: String,
    },

    #[error("unexpected output from `{command}`: {reason}")]
    Parse { command: String, reason: String },
}

/// One entry of `podman image inspect --format json`.
#[derive(Debug, Deserialize)]
pub(crate) struct ImageInspect {
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

impl ImageInspect {
    pub fn has_toolbox_label(&self) -> bool {
        let Some(labels) = &self.labels else {
            return false;
        };
        TOOLBOX_LABELS
            .iter()
            .any(|key| labels.get(*key).is_some_and(|v| v == "true"))
    }
}

/// Subset of `skopeo inspect` output.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteInspect {
    #[serde(rename = "LayersData", default)]
    pub layers_data: Vec<LayerData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LayerData {
    #[serde(rename = "Size", default)]
    pub size: u64,
}

impl RemoteInspect {
    pub fn total_size(&self) -> Option<u64> {
        if self.layers_data.is_empty() {
            return None;
        }
        Some(self.layers_data.iter().map(|l| l.size).sum())
    }
}
