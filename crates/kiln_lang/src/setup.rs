//! A language's installed capability set.

use std::fmt;
use std::sync::Arc;

use kiln_common::{Encoding, SourceUri};

use crate::capability::{Generator, Parser, Validator};

/// Everything the builder needs to process one language's source units.
#[derive(Clone)]
pub struct LanguageSetup {
    /// Setup identifier used to register the language, e.g. `kiln.demo`.
    pub id: String,
    /// Short language identifier used to key output configurations, e.g. `demo`.
    pub language: String,
    /// File extensions (without the dot) this language claims.
    pub file_extensions: Vec<String>,
    /// Turns text into parsed units.
    pub parser: Arc<dyn Parser>,
    /// Checks parsed units.
    pub validator: Arc<dyn Validator>,
    /// Produces generated files.
    pub generator: Arc<dyn Generator>,
    /// Default encoding for this language's units. The registry overwrites it
    /// with the session encoding on registration.
    pub encoding: Encoding,
}

impl LanguageSetup {
    /// Returns `true` if `uri` has one of this language's extensions.
    pub fn handles(&self, uri: &SourceUri) -> bool {
        uri.extension()
            .is_some_and(|ext| self.file_extensions.iter().any(|e| e == ext))
    }
}

impl fmt::Debug for LanguageSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageSetup")
            .field("id", &self.id)
            .field("language", &self.language)
            .field("file_extensions", &self.file_extensions)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
