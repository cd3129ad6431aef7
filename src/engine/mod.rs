// Engine proxy: the narrow command surface used to drive the container engine.

mod podman;
mod run;
mod types;

use std::path::Path;

pub use podman::Podman;
pub use run::command_line;
pub use types::{EngineError, TOOLBOX_LABELS};

/// Operations the orchestration core asks of the container engine.
///
/// Implemented by [`Podman`] for real use and by stubs in tests.
pub trait Engine {
    fn container_exists(&self, name: &str) -> Result<bool, EngineError>;

    fn image_exists(&self, image: &str) -> Result<bool, EngineError>;

    /// Whether the image carries one of the [`TOOLBOX_LABELS`].
    fn is_toolbox_image(&self, image: &str) -> Result<bool, EngineError>;

    /// Total size in bytes of a remote image, summed over its layers.
    fn image_size(&self, image: &str) -> Result<u64, EngineError>;

    fn pull(&self, image: &str, auth_file: Option<&Path>) -> Result<(), EngineError>;

    fn version(&self) -> Result<String, EngineError>;

    fn system_migrate(&self, new_runtime: Option<&str>) -> Result<(), EngineError>;

    /// Run an arbitrary engine subcommand with inherited standard I/O.
    fn invoke(&self, args: &[String]) -> Result<(), EngineError>;
}
