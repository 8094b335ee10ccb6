//! Line traces for generated files and installation of debug information
//! into compiled artifacts.
//!
//! Generators attach a [`SourceTrace`] to the files they produce; the build
//! engine stores it next to the generated file as a sidecar. After the
//! downstream compiler has run, [`install`] reads those sidecars and appends
//! source-mapping metadata to the compiled artifacts, using the strategy
//! configured for each generated file extension.

#![warn(missing_docs)]

pub mod error;
mod format;
pub mod installer;
pub mod request;
pub mod smap;
pub mod trace;

pub use error::{InstallationError, TraceError};
pub use installer::{install, read_debug_info, DebugInfo, InstallReport};
pub use request::{InstallDebugInfoRequest, SourceInstaller, SourceInstallerConfig};
pub use trace::{read_sidecar, sidecar_path, write_sidecar, LineMapping, LocalVariable, SourceTrace};
