// Container bootstrap: the hidden `init-container` entry point run inside new containers.

mod request;
mod setup;

pub use request::BootstrapRequest;
pub use setup::{
    BootstrapError, Bootstrapper, LinkState, MARKER_CANDIDATES, ensure_symlink, park_forever,
};
