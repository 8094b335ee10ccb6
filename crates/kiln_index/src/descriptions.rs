//! Resource-description snapshots and their mutable working copies.

use crate::description::{ExportedSymbol, ResourceDescription};
use crate::name::QualifiedName;
use kiln_common::SourceUri;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Mutable collection of unit descriptions for one container.
///
/// Keeps a name → exporters index alongside the descriptions so lookups by
/// qualified name do not scan every unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceDescriptionsData {
    descriptions: BTreeMap<SourceUri, Arc<ResourceDescription>>,
    exporters: BTreeMap<QualifiedName, BTreeSet<SourceUri>>,
}

impl ResourceDescriptionsData {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a unit's description, returning the previous one.
    pub fn insert(&mut self, description: ResourceDescription) -> Option<Arc<ResourceDescription>> {
        let uri = description.uri.clone();
        let previous = self.remove(&uri);
        for symbol in &description.exported {
            self.exporters
                .entry(symbol.name.clone())
                .or_default()
                .insert(uri.clone());
        }
        self.descriptions.insert(uri, Arc::new(description));
        previous
    }

    /// Removes a unit's description, returning it.
    pub fn remove(&mut self, uri: &SourceUri) -> Option<Arc<ResourceDescription>> {
        let previous = self.descriptions.remove(uri)?;
        for symbol in &previous.exported {
            if let Some(units) = self.exporters.get_mut(&symbol.name) {
                units.remove(uri);
                if units.is_empty() {
                    self.exporters.remove(&symbol.name);
                }
            }
        }
        Some(previous)
    }

    /// Returns the description of `uri`.
    pub fn get(&self, uri: &SourceUri) -> Option<&Arc<ResourceDescription>> {
        self.descriptions.get(uri)
    }

    /// Returns `true` if `uri` has a description.
    pub fn contains(&self, uri: &SourceUri) -> bool {
        self.descriptions.contains_key(uri)
    }

    /// Iterates descriptions in URI order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDescription>> {
        self.descriptions.values()
    }

    /// Iterates the described URIs in order.
    pub fn uris(&self) -> impl Iterator<Item = &SourceUri> {
        self.descriptions.keys()
    }

    /// Number of described units.
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// Returns `true` if no unit is described.
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Resolves `name` to the first unit (in URI order) exporting it.
    pub fn lookup(&self, name: &QualifiedName) -> Option<(&ResourceDescription, &ExportedSymbol)> {
        let uri = self.exporters.get(name)?.iter().next()?;
        let description = self.descriptions.get(uri)?;
        let symbol = description.export(name)?;
        Some((description, symbol))
    }

    /// Returns every unit referencing at least one of `names`.
    pub fn referencing(&self, names: &BTreeSet<QualifiedName>) -> Vec<SourceUri> {
        if names.is_empty() {
            return Vec::new();
        }
        self.descriptions
            .values()
            .filter(|d| d.references_any(names))
            .map(|d| d.uri.clone())
            .collect()
    }

    /// Freezes this collection into an immutable, cheaply clonable snapshot.
    pub fn freeze(self) -> ResourceDescriptions {
        ResourceDescriptions {
            data: Arc::new(self),
        }
    }
}

/// Immutable snapshot of a container's unit descriptions.
///
/// Clones share the same data. Mutation only happens on a working copy
/// obtained through [`derive_working_copy`](Self::derive_working_copy), so a
/// committed snapshot can never be changed behind a reader's back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceDescriptions {
    data: Arc<ResourceDescriptionsData>,
}

impl ResourceDescriptions {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copies the snapshot into a private, mutable working copy.
    ///
    /// Descriptions themselves are shared through `Arc`; only the maps are copied.
    pub fn derive_working_copy(&self) -> ResourceDescriptionsData {
        (*self.data).clone()
    }

    /// Read access to the underlying collection.
    pub fn data(&self) -> &ResourceDescriptionsData {
        &self.data
    }

    /// Returns the description of `uri`.
    pub fn get(&self, uri: &SourceUri) -> Option<&Arc<ResourceDescription>> {
        self.data.get(uri)
    }

    /// Resolves `name` to an exporting unit.
    pub fn lookup(&self, name: &QualifiedName) -> Option<(&ResourceDescription, &ExportedSymbol)> {
        self.data.lookup(name)
    }

    /// Number of described units.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no unit is described.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if both snapshots share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
