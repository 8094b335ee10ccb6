//! The language registry: setup identifiers and file extensions to capability sets.

use std::collections::BTreeMap;
use std::sync::Arc;

use kiln_common::{Encoding, SourceUri};

use crate::catalog::SetupCatalog;
use crate::error::RegistrationError;
use crate::setup::LanguageSetup;

/// Registered languages, resolvable by source unit.
///
/// Registration needs `&mut self`, so it can only happen while the registry
/// is exclusively owned during startup. Builds share it behind an `Arc` and
/// only ever read.
#[derive(Debug)]
pub struct LanguageRegistry {
    encoding: Encoding,
    setups: BTreeMap<String, Arc<LanguageSetup>>,
    by_extension: BTreeMap<String, Arc<LanguageSetup>>,
}

impl LanguageRegistry {
    /// Creates an empty registry whose languages decode with `encoding`.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            setups: BTreeMap::new(),
            by_extension: BTreeMap::new(),
        }
    }

    /// Creates a registry with every setup in `ids` registered from `catalog`.
    ///
    /// Fails on the first identifier that cannot be registered.
    pub fn from_setups<'a>(
        catalog: &SetupCatalog,
        ids: impl IntoIterator<Item = &'a str>,
        encoding: Encoding,
    ) -> Result<Self, RegistrationError> {
        let mut registry = Self::new(encoding);
        for id in ids {
            registry.register(catalog, id)?;
        }
        Ok(registry)
    }

    /// Registers the setup `id` from `catalog`.
    ///
    /// Registering an identifier that is already registered does nothing.
    pub fn register(&mut self, catalog: &SetupCatalog, id: &str) -> Result<(), RegistrationError> {
        if self.setups.contains_key(id) {
            tracing::debug!(setup = id, "language setup already registered");
            return Ok(());
        }
        let factory = catalog.get(id).ok_or_else(|| RegistrationError::UnknownSetup {
            id: id.to_string(),
            known: catalog.ids().collect::<Vec<_>>().join(", "),
        })?;
        let mut setup = factory();
        setup.id = id.to_string();
        self.install(setup)
    }

    /// Registers an already built setup under its own identifier.
    pub fn install(&mut self, mut setup: LanguageSetup) -> Result<(), RegistrationError> {
        if self.setups.contains_key(&setup.id) {
            return Ok(());
        }
        for ext in &setup.file_extensions {
            if let Some(existing) = self.by_extension.get(ext) {
                return Err(RegistrationError::ExtensionConflict {
                    extension: ext.clone(),
                    existing: existing.id.clone(),
                    incoming: setup.id.clone(),
                });
            }
        }

        setup.encoding = self.encoding;
        let setup = Arc::new(setup);
        for ext in &setup.file_extensions {
            self.by_extension.insert(ext.clone(), Arc::clone(&setup));
        }
        tracing::info!(
            setup = %setup.id,
            language = %setup.language,
            extensions = ?setup.file_extensions,
            "registered language setup"
        );
        self.setups.insert(setup.id.clone(), setup);
        Ok(())
    }

    /// Returns the capability set for `uri`, chosen by file extension.
    pub fn resolve(&self, uri: &SourceUri) -> Option<&Arc<LanguageSetup>> {
        uri.extension().and_then(|ext| self.by_extension.get(ext))
    }

    /// Returns the setup registered under `id`.
    pub fn setup(&self, id: &str) -> Option<&Arc<LanguageSetup>> {
        self.setups.get(id)
    }

    /// Returns the setup whose language identifier is `language`.
    pub fn by_language(&self, language: &str) -> Option<&Arc<LanguageSetup>> {
        self.setups.values().find(|s| s.language == language)
    }

    /// Returns all registered setups in identifier order.
    pub fn setups(&self) -> impl Iterator<Item = &Arc<LanguageSetup>> {
        self.setups.values()
    }

    /// Default encoding of every registered language.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of registered setups.
    pub fn len(&self) -> usize {
        self.setups.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.setups.is_empty()
    }
}
