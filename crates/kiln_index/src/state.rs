//! Paired index + mapping state of a container.

use crate::descriptions::{ResourceDescriptions, ResourceDescriptionsData};
use crate::mapping::Source2GeneratedMapping;
use std::sync::Arc;

/// A container's committed state: descriptions and generated-file mapping.
///
/// The two halves are only ever replaced together. `generation` counts
/// commits; an empty, never-committed container is generation 0.
#[derive(Clone, Debug, Default)]
pub struct IndexState {
    descriptions: ResourceDescriptions,
    mapping: Arc<Source2GeneratedMapping>,
    generation: u64,
}

impl IndexState {
    /// The state of a container with no build history.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn committed(
        descriptions: ResourceDescriptions,
        mapping: Source2GeneratedMapping,
        generation: u64,
    ) -> Self {
        Self {
            descriptions,
            mapping: Arc::new(mapping),
            generation,
        }
    }

    /// The resource-description snapshot.
    pub fn descriptions(&self) -> &ResourceDescriptions {
        &self.descriptions
    }

    /// The source → generated mapping.
    pub fn mapping(&self) -> &Source2GeneratedMapping {
        &self.mapping
    }

    /// Number of commits that led to this state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Derives a private mutable copy of both halves.
    pub fn derive_working_copy(&self) -> WorkingState {
        WorkingState {
            descriptions: self.descriptions.derive_working_copy(),
            mapping: (*self.mapping).clone(),
            base_generation: self.generation,
        }
    }
}

/// A build's private, mutable copy of a container's state.
#[derive(Clone, Debug)]
pub struct WorkingState {
    /// Unit descriptions being updated.
    pub descriptions: ResourceDescriptionsData,
    /// Generated-file mapping being updated.
    pub mapping: Source2GeneratedMapping,
    base_generation: u64,
}

impl WorkingState {
    /// Generation of the committed state this copy was derived from.
    pub fn base_generation(&self) -> u64 {
        self.base_generation
    }

    /// Freezes both halves, ready to be committed.
    pub fn freeze(self) -> (ResourceDescriptions, Source2GeneratedMapping) {
        (self.descriptions.freeze(), self.mapping)
    }
}
