use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::EngineError;
use crate::identity::{ContainerName, ImageRef, ResolvedNames};

use super::prompt::PromptError;

/// Everything needed to create one container.
///
/// `name` and `image` are validated types, so an empty identifier can never
/// reach the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: ContainerName,
    pub image: ImageRef,
    pub release: Option<String>,
    pub auth_file: Option<PathBuf>,
}

impl ContainerSpec {
    pub fn new(names: ResolvedNames, auth_file: Option<PathBuf>) -> Self {
        Self {
            name: names.container,
            image: names.image,
            release: names.release,
            auth_file,
        }
    }
}

/// Shared flag for abandoning a pending confirmation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("container {0} already exists")]
    AlreadyExists(String),

    #[error("failed to check whether {what} exists")]
    Engine {
        what: String,
        #[source]
        source: EngineError,
    },

    /// The user declined (or did not answer) the download confirmation.
    #[error("download of image {0} cancelled by user")]
    Cancelled(String),

    #[error("failed to ask for download confirmation")]
    Prompt(#[source] PromptError),

    #[error("failed to pull image {image}")]
    Pull {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to create container {container}")]
    Invoke {
        container: String,
        #[source]
        source: EngineError,
    },
}
