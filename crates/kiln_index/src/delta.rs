//! Differences between the old and new description of a unit.

use crate::description::ResourceDescription;
use crate::name::QualifiedName;
use kiln_common::SourceUri;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The change a build made to one unit's description.
///
/// `old` is `None` for a unit seen for the first time, `new` is `None` for a
/// deleted unit.
#[derive(Clone, Debug)]
pub struct ResourceDelta {
    /// The unit that changed.
    pub uri: SourceUri,
    /// Description before this build.
    pub old: Option<Arc<ResourceDescription>>,
    /// Description after this build.
    pub new: Option<Arc<ResourceDescription>>,
}

impl ResourceDelta {
    /// Exported names that appeared, disappeared, or changed signature.
    pub fn changed_names(&self) -> BTreeSet<QualifiedName> {
        let empty = Vec::new();
        let old = self.old.as_ref().map_or(&empty, |d| &d.exported);
        let new = self.new.as_ref().map_or(&empty, |d| &d.exported);

        let mut changed = BTreeSet::new();
        for symbol in old {
            match new.iter().find(|s| s.name == symbol.name) {
                Some(current) if current.signature == symbol.signature => {}
                _ => {
                    changed.insert(symbol.name.clone());
                }
            }
        }
        for symbol in new {
            if !old.iter().any(|s| s.name == symbol.name) {
                changed.insert(symbol.name.clone());
            }
        }
        changed
    }

    /// Returns `true` if the exported surface of the unit changed.
    pub fn has_export_changes(&self) -> bool {
        !self.changed_names().is_empty()
    }

    /// Returns `true` if this delta removed the unit.
    pub fn is_removal(&self) -> bool {
        self.new.is_none()
    }
}

/// Union of the changed exported names of all `deltas`.
pub fn changed_names<'a>(deltas: impl IntoIterator<Item = &'a ResourceDelta>) -> BTreeSet<QualifiedName> {
    deltas
        .into_iter()
        .flat_map(ResourceDelta::changed_names)
        .collect()
}
