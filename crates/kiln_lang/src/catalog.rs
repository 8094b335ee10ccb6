//! Static table of the language setups a process can install.

use std::collections::BTreeMap;

use crate::setup::LanguageSetup;

/// Builds a fresh [`LanguageSetup`].
pub type SetupFactory = fn() -> LanguageSetup;

/// Maps setup identifiers to the factories that build them.
///
/// The binary assembles its catalog at startup from the language crates it
/// links; the registry then resolves configured identifiers against it.
#[derive(Clone, Default)]
pub struct SetupCatalog {
    factories: BTreeMap<String, SetupFactory>,
}

impl SetupCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory under `id`, replacing any previous one.
    pub fn with(mut self, id: impl Into<String>, factory: SetupFactory) -> Self {
        self.factories.insert(id.into(), factory);
        self
    }

    /// Returns the factory registered under `id`.
    pub fn get(&self, id: &str) -> Option<SetupFactory> {
        self.factories.get(id).copied()
    }

    /// Returns all known identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for SetupCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
