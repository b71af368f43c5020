//! Binding store: per-injector bindings with parent fallback.
//!
//! Each store owns the bindings declared directly in its injector and holds
//! an optional reference to exactly one parent store. Lookups fall back to
//! the parent for keys absent locally; writes only ever touch the local map.
//! Since a child references its parent rather than copying it, bindings
//! added to the parent later are visible through the child as well.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::binding::Binding;
use crate::key::Key;

/// Maps keys to bindings for one injector.
#[derive(Debug, Default)]
pub struct BindingStore {
    parent: Option<Arc<BindingStore>>,
    bindings: DashMap<Key, Arc<Binding>>,
}

impl BindingStore {
    /// Creates a store with no parent.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates an empty store that falls back to `parent`.
    pub fn child(parent: Arc<BindingStore>) -> Self {
        Self {
            parent: Some(parent),
            bindings: DashMap::new(),
        }
    }

    /// Returns the most specific binding for `key`: the local one if
    /// present, otherwise whatever the parent chain has.
    pub fn find_binding(&self, key: &Key) -> Option<Arc<Binding>> {
        // Clone out of the shard before walking up, so no map lock is held
        // across stores.
        let local = self.local_binding(key);
        if local.is_some() {
            return local;
        }

        let parent = self.parent.as_ref()?;
        trace!(key = %key, "Delegating lookup to parent store");
        parent.find_binding(key)
    }

    /// Returns the binding declared in this store for `key`, ignoring the
    /// parent.
    pub fn local_binding(&self, key: &Key) -> Option<Arc<Binding>> {
        self.bindings.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts or replaces the local binding for the binding's key.
    ///
    /// Returns the binding that was replaced, if any.
    pub fn set_binding(&self, binding: Arc<Binding>) -> Option<Arc<Binding>> {
        let key = *binding.key();
        self.bindings.insert(key, binding)
    }

    /// Bindings declared directly in this store.
    pub fn get_bindings(&self) -> Vec<Arc<Binding>> {
        self.bindings.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns `true` if `key` is bound in this store, ignoring the parent.
    pub fn contains_local(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn parent(&self) -> Option<&Arc<BindingStore>> {
        self.parent.as_ref()
    }

    /// Number of local bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
