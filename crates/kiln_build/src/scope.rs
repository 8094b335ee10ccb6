//! The scope a build's units are validated and generated against.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use kiln_common::ContainerHandle;
use kiln_index::{IndexState, QualifiedName, ResourceDescriptionsData};
use kiln_lang::{ResolvedSymbol, Scope};

use crate::classpath::ClasspathContext;

/// Overlays a build's working descriptions on the other containers' committed state.
///
/// Names resolve in the container being built first, then in the other
/// containers in handle order.
pub struct ContextualIndex<'a> {
    container: &'a ContainerHandle,
    working: &'a ResourceDescriptionsData,
    others: &'a BTreeMap<ContainerHandle, Arc<IndexState>>,
    classpath: &'a ClasspathContext,
}

impl<'a> ContextualIndex<'a> {
    /// Creates a scope for `container`.
    pub fn new(
        container: &'a ContainerHandle,
        working: &'a ResourceDescriptionsData,
        others: &'a BTreeMap<ContainerHandle, Arc<IndexState>>,
        classpath: &'a ClasspathContext,
    ) -> Self {
        Self {
            container,
            working,
            others,
            classpath,
        }
    }
}

impl Scope for ContextualIndex<'_> {
    fn resolve(&self, name: &QualifiedName) -> Option<ResolvedSymbol> {
        if let Some((description, symbol)) = self.working.lookup(name) {
            return Some(ResolvedSymbol {
                container: self.container.clone(),
                unit: description.uri.clone(),
                signature: symbol.signature,
            });
        }
        self.others.iter().find_map(|(handle, state)| {
            state
                .descriptions()
                .lookup(name)
                .map(|(description, symbol)| ResolvedSymbol {
                    container: handle.clone(),
                    unit: description.uri.clone(),
                    signature: symbol.signature,
                })
        })
    }

    fn resolve_resource(&self, path: &str) -> Option<PathBuf> {
        self.classpath.resolve(path)
    }
}
