//! Parsing and validation of `kiln.toml` session configuration files.
//!
//! This crate reads the session configuration and produces a strongly-typed
//! [`KilnConfig`], then resolves each container's relative paths against the
//! directory the file lives in.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_output_languages, CONFIG_FILE_NAME};
pub use resolve::{resolve_container, resolve_debug_info, ResolvedContainer, ResolvedDebugInfo, ResolvedOutlet};
pub use types::*;
