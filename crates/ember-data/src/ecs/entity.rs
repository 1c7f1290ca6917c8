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

//! Entity index allocation, recycling, and per-entity records.

use ember_core::EntityId;

use super::signature::Signature;
use crate::error::EcsError;

/// What the registry knows about a live entity.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityRecord {
    /// The components this entity owns.
    pub(crate) signature: Signature,
    /// The scene whose entity list holds this entity.
    pub(crate) scene: String,
}

/// Owns entity allocation and the signature-per-entity table.
///
/// Indices are handed out from an incrementing counter until it reaches the
/// configured capacity; after that, freed indices are reused from a
/// last-in-first-out stack. A reused index gets its generation bumped, so an
/// `EntityId` kept across the deletion no longer matches the slot.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    capacity: u32,
    /// One slot per index ever handed out. The record is `Some` only while
    /// the entity is alive.
    slots: Vec<(EntityId, Option<EntityRecord>)>,
    /// Indices available for reuse, most recently freed last.
    recycled: Vec<u32>,
    live: usize,
}

impl EntityRegistry {
    /// Creates a registry for at most `capacity` live entities.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            recycled: Vec::new(),
            live: 0,
        }
    }

    /// Allocates an id for a new entity belonging to `scene`.
    ///
    /// The record starts with an empty signature.
    pub(crate) fn allocate(&mut self, scene: &str) -> Result<EntityId, EcsError> {
        let record = EntityRecord {
            signature: Signature::EMPTY,
            scene: scene.to_owned(),
        };

        let id = if (self.slots.len() as u32) < self.capacity {
            let id = EntityId::new(self.slots.len() as u32, 0);
            self.slots.push((id, Some(record)));
            id
        } else if let Some(index) = self.recycled.pop() {
            let (id, slot) = &mut self.slots[index as usize];
            id.generation = id.generation.wrapping_add(1);
            *slot = Some(record);
            *id
        } else {
            return Err(EcsError::CapacityExhausted {
                capacity: self.capacity,
            });
        };

        self.live += 1;
        Ok(id)
    }

    /// Releases a live entity's slot. Returns `false` for an unknown or stale id.
    pub(crate) fn free(&mut self, id: EntityId) -> bool {
        match self.slots.get_mut(id.index as usize) {
            Some((slot_id, record)) if *slot_id == id && record.is_some() => {
                *record = None;
                self.recycled.push(id.index);
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.slots
            .get(id.index as usize)
            .and_then(|(slot_id, record)| if *slot_id == id { record.as_ref() } else { None })
    }

    pub(crate) fn record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.slots
            .get_mut(id.index as usize)
            .and_then(|(slot_id, record)| if *slot_id == id { record.as_mut() } else { None })
    }

    /// Returns true if `id` refers to a live entity of the current generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_some()
    }

    /// The components owned by `id`.
    pub fn signature(&self, id: EntityId) -> Option<Signature> {
        self.record(id).map(|record| record.signature)
    }

    pub(crate) fn signature_mut(&mut self, id: EntityId) -> Option<&mut Signature> {
        self.record_mut(id).map(|record| &mut record.signature)
    }

    /// The name of the scene `id` belongs to.
    pub fn scene_of(&self, id: EntityId) -> Option<&str> {
        self.record(id).map(|record| record.scene.as_str())
    }

    /// The number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The maximum number of live entities.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Iterates over live entities in index order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .filter(|(_, record)| record.is_some())
            .map(|(id, _)| *id)
    }
}
