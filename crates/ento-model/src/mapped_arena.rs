//! A generational arena with a name-keyed fast-path lookup, used to store
//! entities in a [`Registry`](crate::Registry). Insertion order is
//! preserved so the `iter()` traversal order matches declaration order,
//! which several invariants in §8 depend on (field `_index_` ordering,
//! polymorph ancestor-before-descendant ordering).

use std::collections::HashMap;
use std::collections::hash_map::Keys;
use std::ops;

use typed_generational_arena::{Arena, IgnoreGeneration, Index};

pub type Slab<T> = Arena<T, usize, IgnoreGeneration>;
pub type SlabIndex<T> = Index<T, usize, IgnoreGeneration>;

#[derive(Debug, Clone)]
pub struct MappedArena<V> {
    values: Slab<V>,
    by_key: HashMap<String, SlabIndex<V>>,
}

impl<V> MappedArena<V> {
    pub fn values(&self) -> &Slab<V> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, String, SlabIndex<V>> {
        self.by_key.keys()
    }

    pub fn get_id(&self, key: &str) -> Option<SlabIndex<V>> {
        self.by_key.get(key).copied()
    }

    pub fn get_by_key(&self, key: &str) -> Option<&V> {
        self.get_id(key).map(|id| &self[id])
    }

    pub fn get_by_key_mut(&mut self, key: &str) -> Option<&mut V> {
        let id = self.get_id(key)?;
        Some(&mut self[id])
    }

    /// Insert `value` under `key`. Returns the existing index unchanged if
    /// `key` was already registered (entities are inserted once, at
    /// declaration time).
    pub fn add(&mut self, key: &str, value: V) -> SlabIndex<V> {
        if let Some(existing) = self.get_id(key) {
            return existing;
        }
        let id = self.values.insert(value);
        self.by_key.insert(key.to_string(), id);
        id
    }

    pub fn iter(&self) -> typed_generational_arena::Iter<'_, V, usize, IgnoreGeneration> {
        self.values.iter()
    }
}

impl<V> Default for MappedArena<V> {
    fn default() -> Self {
        MappedArena {
            values: Slab::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<V> ops::Index<SlabIndex<V>> for MappedArena<V> {
    type Output = V;

    fn index(&self, id: SlabIndex<V>) -> &V {
        &self.values[id]
    }
}

impl<V> ops::IndexMut<SlabIndex<V>> for MappedArena<V> {
    fn index_mut(&mut self, id: SlabIndex<V>) -> &mut V {
        &mut self.values[id]
    }
}
