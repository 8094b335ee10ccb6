//! The container index store and the data it holds.
//!
//! For every container the store keeps one committed [`IndexState`]: the
//! [`ResourceDescriptions`] snapshot (what each source unit exports and
//! references) paired with its [`Source2GeneratedMapping`]. Committed states
//! are immutable; a build derives a [`WorkingState`] from one, mutates it
//! privately, freezes it, and commits it back as a whole.

#![warn(missing_docs)]

pub mod delta;
pub mod description;
pub mod descriptions;
pub mod mapping;
pub mod name;
pub mod state;
pub mod store;

pub use delta::{changed_names, ResourceDelta};
pub use description::{ExportedSymbol, ResourceDescription};
pub use descriptions::{ResourceDescriptions, ResourceDescriptionsData};
pub use mapping::Source2GeneratedMapping;
pub use name::QualifiedName;
pub use state::{IndexState, WorkingState};
pub use store::{ContainerGuard, IndexStore, Invalidations};
