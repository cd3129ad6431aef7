// Creation orchestrator: resolves, pulls and creates Toolbx containers.

mod args;
mod orchestrator;
mod prompt;
mod types;

pub use args::{
    Assembly, EXECUTABLE_TARGET, PROFILE_SCRIPT_SOURCES, PROFILE_SCRIPT_TARGET, TOOLBOX_LABEL,
    create_args,
};
pub use orchestrator::Orchestrator;
pub use prompt::{Console, PromptError, Terminal, ask_with_deadline, human_size, parse_confirmation};
pub use types::{CancelToken, ContainerSpec, CreateError};
