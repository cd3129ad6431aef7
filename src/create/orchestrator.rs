use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::host::Host;

use super::args::{Assembly, create_args};
use super::prompt::{Console, PromptError, human_size, parse_confirmation};
use super::types::{ContainerSpec, CreateError};

/// Drives one `create` from the existence check to the engine invocation.
pub struct Orchestrator<'a, E: Engine + ?Sized, H: Host, C: Console> {
    engine: &'a E,
    host: &'a H,
    console: C,
    assembly: Assembly<'a>,
    assume_yes: bool,
}

impl<'a, E: Engine + ?Sized, H: Host, C: Console> Orchestrator<'a, E, H, C> {
    pub fn new(engine: &'a E, host: &'a H, console: C, assembly: Assembly<'a>) -> Self {
        Self {
            engine,
            host,
            console,
            assembly,
            assume_yes: false,
        }
    }

    /// Pull missing images without asking.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn create(&mut self, spec: &ContainerSpec) -> Result<(), CreateError> {
        let name = spec.name.as_str();
        let image = spec.image.as_str();

        debug!("Checking if container {name} already exists");
        let exists = self
            .engine
            .container_exists(name)
            .map_err(|source| CreateError::Engine {
                what: format!("container {name}"),
                source,
            })?;
        if exists {
            return Err(CreateError::AlreadyExists(name.to_string()));
        }

        self.ensure_image(spec)?;

        match self.engine.is_toolbox_image(image) {
            Ok(true) => {}
            Ok(false) => warn!("Image {image} does not look like a Toolbx image"),
            Err(e) => warn!("Failed to inspect image {image}: {e}"),
        }

        let args = create_args(spec, self.host, &self.assembly);
        info!("Creating container {name} from {image}");
        self.engine
            .invoke(&args)
            .map_err(|source| CreateError::Invoke {
                container: name.to_string(),
                source,
            })
    }

    /// Make sure the image is available locally, asking before a download
    /// when someone can answer.
    fn ensure_image(&mut self, spec: &ContainerSpec) -> Result<(), CreateError> {
        let image = spec.image.as_str();

        debug!("Looking for image {image}");
        let present = self
            .engine
            .image_exists(image)
            .map_err(|source| CreateError::Engine {
                what: format!("image {image}"),
                source,
            })?;
        if present {
            return Ok(());
        }

        if !self.assume_yes && self.console.is_interactive() && !self.confirm_download(image)? {
            return Err(CreateError::Cancelled(image.to_string()));
        }

        info!("Pulling {image}");
        self.engine
            .pull(image, spec.auth_file.as_deref())
            .map_err(|source| CreateError::Pull {
                image: image.to_string(),
                source,
            })
    }

    fn confirm_download(&mut self, image: &str) -> Result<bool, CreateError> {
        let size = match self.engine.image_size(image) {
            Ok(bytes) => Some(human_size(bytes as f64)),
            Err(e) => {
                debug!("Failed to get the size of {image}: {e}");
                None
            }
        };
        let question = match size {
            Some(size) => format!("Download {image} ({size})? [y/N]: "),
            None => format!("Download {image}? [y/N]: "),
        };
        let prompt = format!("Image required to create Toolbx container.\n{question}");

        match self.console.ask(&prompt) {
            Ok(answer) => Ok(parse_confirmation(&answer)),
            Err(PromptError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
            Err(PromptError::Cancelled | PromptError::TimedOut(_)) => Ok(false),
            Err(e) => Err(CreateError::Prompt(e)),
        }
    }
}
