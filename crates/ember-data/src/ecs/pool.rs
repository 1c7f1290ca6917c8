// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sparse-set storage for one component type.

use ember_core::EntityId;
use std::any::Any;

const VACANT: u32 = u32::MAX;

/// Dense storage of `T` values keyed by entity.
///
/// `dense[i]` belongs to `entities[i]`, and `sparse[entity.index]` points
/// back at `i`. Insert, remove and lookup are O(1); iteration touches only
/// entities that own a `T`, in insertion order. Removal moves the last value
/// into the freed slot, so slot positions are not stable across removals.
#[derive(Debug, Clone)]
pub struct ComponentPool<T> {
    dense: Vec<T>,
    entities: Vec<EntityId>,
    sparse: Vec<u32>,
}

impl<T> Default for ComponentPool<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: Vec::new(),
        }
    }
}

impl<T> ComponentPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns true if the pool holds no value.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn slot(&self, id: EntityId) -> Option<usize> {
        let slot = *self.sparse.get(id.index as usize)?;
        if slot == VACANT || self.entities[slot as usize] != id {
            return None;
        }
        Some(slot as usize)
    }

    /// Returns true if `id` (including its generation) has a value here.
    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// Stores `value` for `id`, replacing any previous value.
    pub fn insert(&mut self, id: EntityId, value: T) -> &mut T {
        if let Some(slot) = self.slot(id) {
            self.dense[slot] = value;
            return &mut self.dense[slot];
        }
        let index = id.index as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, VACANT);
        }
        self.sparse[index] = self.dense.len() as u32;
        self.entities.push(id);
        self.dense.push(value);
        let last = self.dense.len() - 1;
        &mut self.dense[last]
    }

    /// Removes and returns the value of `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slot(id)?;
        self.sparse[id.index as usize] = VACANT;
        let value = self.dense.swap_remove(slot);
        self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.sparse[moved.index as usize] = slot as u32;
        }
        Some(value)
    }

    /// The value of `id`, if any.
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.slot(id).map(|slot| &self.dense[slot])
    }

    /// The value of `id`, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.slot(id).map(|slot| &mut self.dense[slot])
    }

    /// Borrows the value of `source` immutably and the value of `target`
    /// mutably at the same time. `None` if either is missing or they are the
    /// same entity.
    pub fn pair_mut(&mut self, source: EntityId, target: EntityId) -> Option<(&T, &mut T)> {
        let src = self.slot(source)?;
        let dst = self.slot(target)?;
        if src == dst {
            return None;
        }
        if src < dst {
            let (low, high) = self.dense.split_at_mut(dst);
            Some((&low[src], &mut high[0]))
        } else {
            let (low, high) = self.dense.split_at_mut(src);
            Some((&high[0], &mut low[dst]))
        }
    }

    /// The owning entities, in storage order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Iterates over `(entity, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.entities.clear();
        self.sparse.clear();
    }
}

/// The type-erased face of a [`ComponentPool`], as stored by the registry.
pub trait ErasedPool: Any + Send + Sync {
    /// Drops the value of `id`. Returns `false` if there was none.
    fn remove_entity(&mut self, id: EntityId) -> bool;
    /// Returns true if `id` has a value here.
    fn contains(&self, id: EntityId) -> bool;
    /// The number of stored values.
    fn len(&self) -> usize;
    /// The owning entities, in storage order.
    fn entities(&self) -> &[EntityId];
    /// Drops every value.
    fn clear(&mut self);
    /// Upcasts to `Any` for downcasting to the concrete pool.
    fn as_any(&self) -> &dyn Any;
    /// Upcasts to `Any` for mutable downcasting to the concrete pool.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static> ErasedPool for ComponentPool<T> {
    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    fn contains(&self, id: EntityId) -> bool {
        ComponentPool::contains(self, id)
    }

    fn len(&self) -> usize {
        ComponentPool::len(self)
    }

    fn entities(&self) -> &[EntityId] {
        ComponentPool::entities(self)
    }

    fn clear(&mut self) {
        ComponentPool::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn remove_swaps_the_last_value_in() {
        // --- 1. ARRANGE ---
        let mut pool = ComponentPool::new();
        for i in 0..4 {
            pool.insert(id(i), i * 10);
        }

        // --- 2. ACT ---
        assert_eq!(pool.remove(id(1)), Some(10));

        // --- 3. ASSERT ---
        assert_eq!(pool.entities(), &[id(0), id(3), id(2)]);
        assert_eq!(pool.get(id(3)), Some(&30));
        assert!(!pool.contains(id(1)));
        assert_eq!(pool.remove(id(1)), None);
    }

    #[test]
    fn stale_generation_does_not_match() {
        let mut pool = ComponentPool::new();
        pool.insert(EntityId::new(5, 1), "new");
        assert!(!pool.contains(EntityId::new(5, 0)));
        assert_eq!(pool.get(EntityId::new(5, 1)), Some(&"new"));
    }

    #[test]
    fn insert_replaces_an_existing_value() {
        let mut pool = ComponentPool::new();
        pool.insert(id(2), 1);
        *pool.insert(id(2), 2) += 1;
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(id(2)), Some(&3));
    }

    #[test]
    fn pair_mut_borrows_two_slots() {
        let mut pool = ComponentPool::new();
        pool.insert(id(0), String::from("source"));
        pool.insert(id(1), String::new());

        let (src, dst) = pool.pair_mut(id(0), id(1)).unwrap();
        dst.push_str(src);
        assert_eq!(pool.get(id(1)).map(String::as_str), Some("source"));

        let (src, dst) = pool.pair_mut(id(1), id(0)).unwrap();
        assert_eq!(src, dst);
        assert!(pool.pair_mut(id(0), id(0)).is_none());
    }
}
