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

//! Defines the generational entity handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an entity in the world.
///
/// It combines a slot index with a generation count. When an entity is deleted
/// its index is pushed on the recycle stack and the slot's generation is bumped,
/// so a handle taken before the deletion no longer resolves once the index is
/// reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// The index of the entity's slot in the entity registry.
    pub index: u32,
    /// A generation counter that is incremented each time the slot is freed.
    pub generation: u32,
}

impl EntityId {
    /// Creates a handle from its raw parts.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_order_by_index_then_generation() {
        let a = EntityId::new(1, 4);
        let b = EntityId::new(2, 0);
        let c = EntityId::new(2, 1);
        assert!(a < b && b < c);
        assert_eq!(c.to_string(), "2v1");
    }
}
