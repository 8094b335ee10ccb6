//! The incremental build engine and the context that drives it.
//!
//! A build starts from an [`ExternalBuildRequest`]. The
//! [`BuildRequestTranslator`] resolves its paths and snapshots the
//! container's committed state into a [`BuildRequest`]; the
//! [`IncrementalBuilder`] reprocesses the directly and transitively dirty
//! units and returns a [`BuildResult`]; [`BuildContext`] commits that result
//! to the [`IndexStore`](kiln_index::IndexStore) and reports the outcome.

#![warn(missing_docs)]

pub mod classpath;
pub mod context;
pub mod engine;
pub mod error;
pub mod output;
pub mod request;
pub mod result;
pub mod scope;
pub mod translator;

pub use classpath::ClasspathContext;
pub use context::{BuildContext, BuildReport};
pub use engine::IncrementalBuilder;
pub use error::BuildError;
pub use output::{OutputConfiguration, OutputConfigurations};
pub use request::{BuildRequest, ExternalBuildRequest, OutletDescription, ProjectDescriptor};
pub use result::BuildResult;
pub use scope::ContextualIndex;
pub use translator::BuildRequestTranslator;
