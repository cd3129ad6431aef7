use std::path::Path;

use super::Engine;
use super::run::{capture, capture_success, failed, inherit};
use super::types::{EngineError, ImageInspect, RemoteInspect};

/// Engine proxy backed by the `podman` command line.
///
/// Image sizes come from `skopeo inspect`, which can look at a remote image
/// without pulling it.
#[derive(Debug, Clone)]
pub struct Podman {
    binary: String,
    skopeo: String,
    log_level: String,
}

impl Podman {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            skopeo: "skopeo".to_string(),
            log_level: "error".to_string(),
        }
    }

    /// Level passed to podman's own `--log-level`.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn args<I, S>(&self, rest: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec!["--log-level".to_string(), self.log_level.clone()];
        args.extend(rest.into_iter().map(Into::into));
        args
    }

    /// `podman <kind> exists <name>` exits 0 when present and 1 when absent.
    fn exists(&self, kind: &str, name: &str) -> Result<bool, EngineError> {
        let args = self.args([kind, "exists", name]);
        let output = capture(&self.binary, &args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failed(&self.binary, &args, output.status, &output.stderr)),
        }
    }
}

impl Default for Podman {
    fn default() -> Self {
        Self::new("podman")
    }
}

impl Engine for Podman {
    fn container_exists(&self, name: &str) -> Result<bool, EngineError> {
        self.exists("container", name)
    }

    fn image_exists(&self, image: &str) -> Result<bool, EngineError> {
        self.exists("image", image)
    }

    fn is_toolbox_image(&self, image: &str) -> Result<bool, EngineError> {
        let args = self.args(["image", "inspect", "--format", "json", image]);
        let stdout = capture_success(&self.binary, &args)?;
        let images: Vec<ImageInspect> =
            serde_json::from_str(&stdout).map_err(|e| EngineError::Parse {
                command: format!("{} image inspect", self.binary),
                reason: e.to_string(),
            })?;
        Ok(images.iter().any(ImageInspect::has_toolbox_label))
    }

    fn image_size(&self, image: &str) -> Result<u64, EngineError> {
        let args = vec!["inspect".to_string(), format!("docker://{image}")];
        let stdout = capture_success(&self.skopeo, &args)?;
        let inspect: RemoteInspect =
            serde_json::from_str(&stdout).map_err(|e| EngineError::Parse {
                command: format!("{} inspect", self.skopeo),
                reason: e.to_string(),
            })?;
        inspect.total_size().ok_or_else(|| EngineError::Parse {
            command: format!("{} inspect", self.skopeo),
            reason: "no layer sizes reported".to_string(),
        })
    }

    fn pull(&self, image: &str, auth_file: Option<&Path>) -> Result<(), EngineError> {
        let mut rest = vec!["pull".to_string()];
        if let Some(path) = auth_file {
            rest.push("--authfile".into());
            rest.push(path.display().to_string());
        }
        rest.push(image.to_string());
        inherit(&self.binary, &self.args(rest))
    }

    fn version(&self) -> Result<String, EngineError> {
        let args = vec![
            "version".to_string(),
            "--format".into(),
            "{{.Client.Version}}".into(),
        ];
        let stdout = capture_success(&self.binary, &args)?;
        let version = stdout.trim();
        if version.is_empty() {
            return Err(EngineError::Parse {
                command: format!("{} version", self.binary),
                reason: "empty version string".to_string(),
            });
        }
        Ok(version.to_string())
    }

    fn system_migrate(&self, new_runtime: Option<&str>) -> Result<(), EngineError> {
        let mut rest = vec!["system".to_string(), "migrate".into()];
        if let Some(runtime) = new_runtime {
            rest.push("--new-runtime".into());
            rest.push(runtime.to_string());
        }
        capture_success(&self.binary, &self.args(rest)).map(|_| ())
    }

    fn invoke(&self, args: &[String]) -> Result<(), EngineError> {
        inherit(&self.binary, args)
    }
}
