//! Static call-sequence extraction for Elixir modules.
//!
//! Builds a module index over a set of source locations, walks one entry
//! function (following pipes and `Module.function` calls into their own
//! definitions) and renders the resulting call records as a Mermaid
//! sequence diagram.

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::Engine;
pub use crate::error::{CalltrailError, Result};
