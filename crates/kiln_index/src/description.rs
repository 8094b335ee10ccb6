//! Per-unit symbol summaries.

use crate::name::QualifiedName;
use kiln_common::{ContentHash, SourceUri};
use std::collections::BTreeSet;

/// A symbol a unit makes visible to other units.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExportedSymbol {
    /// Fully qualified name.
    pub name: QualifiedName,
    /// Hash of the symbol's signature. A change here invalidates referrers.
    pub signature: ContentHash,
}

/// Summary of one source unit: what it exports and what it references.
///
/// Descriptions let the builder resolve cross-unit references and compute
/// invalidation without re-parsing every unit.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResourceDescription {
    /// The unit described.
    pub uri: SourceUri,
    /// Exported symbols, in declaration order.
    pub exported: Vec<ExportedSymbol>,
    /// Names this unit refers to.
    pub references: BTreeSet<QualifiedName>,
    /// Set when the unit failed to parse cleanly.
    pub has_errors: bool,
}

impl ResourceDescription {
    /// Creates an empty description for `uri`.
    pub fn new(uri: SourceUri) -> Self {
        Self {
            uri,
            exported: Vec::new(),
            references: BTreeSet::new(),
            has_errors: false,
        }
    }

    /// Adds an exported symbol.
    pub fn with_export(mut self, name: QualifiedName, signature: ContentHash) -> Self {
        self.exported.push(ExportedSymbol { name, signature });
        self
    }

    /// Adds a referenced name.
    pub fn with_reference(mut self, name: QualifiedName) -> Self {
        self.references.insert(name);
        self
    }

    /// Marks the description as coming from a unit with parse errors.
    pub fn flagged(mut self, has_errors: bool) -> Self {
        self.has_errors = has_errors;
        self
    }

    /// Returns the exported symbol called `name`, if any.
    pub fn export(&self, name: &QualifiedName) -> Option<&ExportedSymbol> {
        self.exported.iter().find(|s| &s.name == name)
    }

    /// Returns `true` if this unit references any of `names`.
    pub fn references_any(&self, names: &BTreeSet<QualifiedName>) -> bool {
        if self.references.len() < names.len() {
            self.references.iter().any(|r| names.contains(r))
        } else {
            names.iter().any(|n| self.references.contains(n))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn uri(name: &str) -> SourceUri {
        SourceUri::from_absolute(&Path::new("/w").join(name))
    }

    #[test]
    fn builder_collects_exports_and_references() {
        let desc = ResourceDescription::new(uri("A.lang"))
            .with_export("A.foo".into(), ContentHash::of_str("()"))
            .with_reference("B.bar".into());
        assert!(desc.export(&"A.foo".into()).is_some());
        assert!(desc.export(&"A.bar".into()).is_none());
        assert!(desc.references.contains(&QualifiedName::from("B.bar")));
        assert!(!desc.has_errors);
    }

    #[test]
    fn references_any_matches_either_direction() {
        let desc = ResourceDescription::new(uri("B.lang"))
            .with_reference("A.foo".into())
            .with_reference("A.baz".into());
        let one: BTreeSet<QualifiedName> = ["A.foo".into()].into();
        let many: BTreeSet<QualifiedName> = ["X.a".into(), "X.b".into(), "X.c".into(), "A.baz".into()].into();
        let none: BTreeSet<QualifiedName> = ["A.qux".into()].into();
        assert!(desc.references_any(&one));
        assert!(desc.references_any(&many));
        assert!(!desc.references_any(&none));
    }
}
