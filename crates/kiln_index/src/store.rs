//! Process-wide mapping from container handle to committed index state.

use crate::descriptions::ResourceDescriptions;
use crate::mapping::Source2GeneratedMapping;
use crate::name::QualifiedName;
use crate::state::IndexState;
use kiln_common::ContainerHandle;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct ContainerSlot {
    build_lock: Arc<Mutex<()>>,
    state: RwLock<Arc<IndexState>>,
    invalidated: Mutex<BTreeMap<QualifiedName, u64>>,
}

impl ContainerSlot {
    fn new() -> Self {
        Self {
            build_lock: Arc::new(Mutex::new(())),
            state: RwLock::new(Arc::new(IndexState::empty())),
            invalidated: Mutex::new(BTreeMap::new()),
        }
    }
}

/// Names changed by builds of other containers that a container has not
/// rebuilt against yet.
///
/// Each name carries the stamp of the invalidation that recorded it, so
/// acknowledging a set only clears entries that were not invalidated again
/// in the meantime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidations {
    names: BTreeMap<QualifiedName, u64>,
}

impl Invalidations {
    /// The invalidated names.
    pub fn names(&self) -> impl Iterator<Item = &QualifiedName> {
        self.names.keys()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of pending names.
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Exclusive right to build and commit one container.
///
/// Obtained from [`IndexStore::lock_container`]; only one guard per handle
/// exists at a time, which is what keeps two commits of the same container
/// from racing.
pub struct ContainerGuard {
    handle: ContainerHandle,
    _lock: ArcMutexGuard<RawMutex, ()>,
}

impl ContainerGuard {
    /// The container this guard locks.
    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }
}

/// The container index store.
///
/// Holds one committed [`IndexState`] per container. Reads hand out shared
/// snapshots; [`commit`](Self::commit) swaps in a new state atomically, so a
/// reader sees either the old pair or the new pair, never a mix. Entries are
/// created lazily on first lock or commit and never removed.
#[derive(Default)]
pub struct IndexStore {
    containers: RwLock<HashMap<ContainerHandle, Arc<ContainerSlot>>>,
    stamp: AtomicU64,
}

impl IndexStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, handle: &ContainerHandle) -> Arc<ContainerSlot> {
        if let Some(slot) = self.containers.read().get(handle) {
            return Arc::clone(slot);
        }
        let mut containers = self.containers.write();
        Arc::clone(
            containers
                .entry(handle.clone())
                .or_insert_with(|| Arc::new(ContainerSlot::new())),
        )
    }

    /// Returns the committed state of `handle`, or an empty state if it has no history.
    pub fn get_state(&self, handle: &ContainerHandle) -> Arc<IndexState> {
        match self.containers.read().get(handle) {
            Some(slot) => Arc::clone(&slot.state.read()),
            None => Arc::new(IndexState::empty()),
        }
    }

    /// Returns the committed description snapshot of `handle`.
    pub fn get_snapshot(&self, handle: &ContainerHandle) -> ResourceDescriptions {
        self.get_state(handle).descriptions().clone()
    }

    /// Returns a copy of the committed mapping of `handle`.
    pub fn get_mapping(&self, handle: &ContainerHandle) -> Source2GeneratedMapping {
        self.get_state(handle).mapping().clone()
    }

    /// Committed states of every container except `exclude`, keyed by handle.
    pub fn snapshot_others(&self, exclude: &ContainerHandle) -> BTreeMap<ContainerHandle, Arc<IndexState>> {
        self.containers
            .read()
            .iter()
            .filter(|(handle, _)| *handle != exclude)
            .map(|(handle, slot)| (handle.clone(), Arc::clone(&slot.state.read())))
            .collect()
    }

    /// Handles of every container the store knows, sorted.
    pub fn containers(&self) -> Vec<ContainerHandle> {
        let mut handles: Vec<_> = self.containers.read().keys().cloned().collect();
        handles.sort();
        handles
    }

    /// Records that `names` changed in another container and that units of
    /// `handle` referencing them must be rechecked by its next build.
    pub fn invalidate(&self, handle: &ContainerHandle, names: impl IntoIterator<Item = QualifiedName>) {
        let stamp = self.stamp.fetch_add(1, Ordering::Relaxed) + 1;
        let slot = self.slot(handle);
        let mut invalidated = slot.invalidated.lock();
        let before = invalidated.len();
        for name in names {
            invalidated.insert(name, stamp);
        }
        tracing::debug!(
            container = %handle,
            pending = invalidated.len(),
            added = invalidated.len() - before,
            "recorded invalidated names"
        );
    }

    /// Names invalidated for `handle` that no build has acknowledged yet.
    pub fn invalidations(&self, handle: &ContainerHandle) -> Invalidations {
        match self.containers.read().get(handle) {
            Some(slot) => Invalidations {
                names: slot.invalidated.lock().clone(),
            },
            None => Invalidations::default(),
        }
    }

    /// Clears the entries of `seen` the guarded container has rebuilt against.
    ///
    /// A name invalidated again after `seen` was read stays pending.
    pub fn acknowledge(&self, guard: &ContainerGuard, seen: &Invalidations) {
        if seen.is_empty() {
            return;
        }
        let slot = self.slot(&guard.handle);
        slot.invalidated
            .lock()
            .retain(|name, stamp| seen.names.get(name) != Some(stamp));
    }

    /// Blocks until no other build holds `handle`, then locks it.
    pub fn lock_container(&self, handle: &ContainerHandle) -> ContainerGuard {
        let slot = self.slot(handle);
        let lock = Arc::clone(&slot.build_lock);
        let guard = lock.lock_arc();
        tracing::trace!(container = %handle, "container locked");
        ContainerGuard {
            handle: handle.clone(),
            _lock: guard,
        }
    }

    /// Atomically replaces the guarded container's descriptions and mapping.
    ///
    /// Returns the generation of the new state.
    pub fn commit(
        &self,
        guard: &ContainerGuard,
        snapshot: ResourceDescriptions,
        mapping: Source2GeneratedMapping,
    ) -> u64 {
        let slot = self.slot(&guard.handle);
        let mut state = slot.state.write();
        let generation = state.generation() + 1;
        *state = Arc::new(IndexState::committed(snapshot, mapping, generation));
        tracing::debug!(
            container = %guard.handle,
            generation,
            units = state.descriptions().len(),
            "committed index state"
        );
        generation
    }
}
