//! Toolbx: create and initialize interactive development containers on top
//! of Podman.
//!
//! The binary in `main.rs` wires these modules together; everything here is
//! usable (and tested) without a real engine.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod create;
pub mod engine;
pub mod host;
pub mod identity;
pub mod migrate;
pub mod platform;
