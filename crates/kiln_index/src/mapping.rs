//! Bidirectional source → generated-file mapping.

use kiln_common::SourceUri;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Records which generated files were produced from which source unit.
///
/// Both directions are kept in sync: every edge source → generated has the
/// matching edge generated → source, so removing a source never leaves a
/// dangling generated entry behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Source2GeneratedMapping {
    /// source → (generated path → outlet name)
    source_to_generated: BTreeMap<SourceUri, BTreeMap<PathBuf, String>>,
    generated_to_source: BTreeMap<PathBuf, BTreeSet<SourceUri>>,
}

impl Source2GeneratedMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `source` produced `generated` into `outlet`.
    pub fn add(&mut self, source: &SourceUri, generated: &Path, outlet: &str) {
        self.source_to_generated
            .entry(source.clone())
            .or_default()
            .insert(generated.to_path_buf(), outlet.to_string());
        self.generated_to_source
            .entry(generated.to_path_buf())
            .or_default()
            .insert(source.clone());
    }

    /// Removes the single edge `source` → `generated`.
    pub fn remove_edge(&mut self, source: &SourceUri, generated: &Path) {
        if let Some(outputs) = self.source_to_generated.get_mut(source) {
            outputs.remove(generated);
            if outputs.is_empty() {
                self.source_to_generated.remove(source);
            }
        }
        if let Some(sources) = self.generated_to_source.get_mut(generated) {
            sources.remove(source);
            if sources.is_empty() {
                self.generated_to_source.remove(generated);
            }
        }
    }

    /// Removes every edge of `source`, returning its former outputs with outlet names.
    pub fn delete_source(&mut self, source: &SourceUri) -> Vec<(PathBuf, String)> {
        let Some(outputs) = self.source_to_generated.remove(source) else {
            return Vec::new();
        };
        for generated in outputs.keys() {
            if let Some(sources) = self.generated_to_source.get_mut(generated) {
                sources.remove(source);
                if sources.is_empty() {
                    self.generated_to_source.remove(generated);
                }
            }
        }
        outputs.into_iter().collect()
    }

    /// Returns the generated files of `source` with their outlet names.
    pub fn generated_for(&self, source: &SourceUri) -> Vec<(&Path, &str)> {
        self.source_to_generated
            .get(source)
            .map(|outputs| {
                outputs
                    .iter()
                    .map(|(path, outlet)| (path.as_path(), outlet.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the sources that produced `generated`.
    pub fn sources_for(&self, generated: &Path) -> Vec<&SourceUri> {
        self.generated_to_source
            .get(generated)
            .map(|sources| sources.iter().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if some source still owns `generated`.
    pub fn is_generated(&self, generated: &Path) -> bool {
        self.generated_to_source.contains_key(generated)
    }

    /// Every generated file, in path order.
    pub fn all_generated(&self) -> impl Iterator<Item = &Path> {
        self.generated_to_source.keys().map(PathBuf::as_path)
    }

    /// Every source with at least one generated file.
    pub fn all_sources(&self) -> impl Iterator<Item = &SourceUri> {
        self.source_to_generated.keys()
    }

    /// Returns `true` if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.source_to_generated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> SourceUri {
        SourceUri::from_absolute(&Path::new("/w/src").join(name))
    }

    fn out(name: &str) -> PathBuf {
        Path::new("/w/gen").join(name)
    }

    #[test]
    fn add_records_both_directions() {
        let mut m = Source2GeneratedMapping::new();
        m.add(&uri("A.lang"), &out("A.out"), "default");
        assert_eq!(m.generated_for(&uri("A.lang")), vec![(out("A.out").as_path(), "default")]);
        assert_eq!(m.sources_for(&out("A.out")), vec![&uri("A.lang")]);
        assert!(m.is_generated(&out("A.out")));
    }

    #[test]
    fn delete_source_leaves_no_dangling_entries() {
        let mut m = Source2GeneratedMapping::new();
        m.add(&uri("A.lang"), &out("A.out"), "default");
        m.add(&uri("A.lang"), &out("A.idx"), "index");
        let removed = m.delete_source(&uri("A.lang"));
        assert_eq!(removed.len(), 2);
        assert!(m.is_empty());
        assert_eq!(m.all_generated().count(), 0);
    }

    #[test]
    fn shared_output_kept_for_remaining_source() {
        let mut m = Source2GeneratedMapping::new();
        m.add(&uri("A.lang"), &out("all.out"), "default");
        m.add(&uri("B.lang"), &out("all.out"), "default");
        m.delete_source(&uri("A.lang"));
        assert!(m.is_generated(&out("all.out")));
        assert_eq!(m.sources_for(&out("all.out")), vec![&uri("B.lang")]);
    }

    #[test]
    fn remove_edge_prunes_empty_sides() {
        let mut m = Source2GeneratedMapping::new();
        m.add(&uri("A.lang"), &out("A.out"), "default");
        m.remove_edge(&uri("A.lang"), &out("A.out"));
        assert!(m.is_empty());
        assert!(!m.is_generated(&out("A.out")));
    }

    #[test]
    fn delete_unknown_source_is_noop() {
        let mut m = Source2GeneratedMapping::new();
        assert!(m.delete_source(&uri("nope.lang")).is_empty());
    }
}
