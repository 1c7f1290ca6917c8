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

//! Maps component types to signature bits, pools and invokers.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use super::component::Component;
use super::ops::{ComponentInvoker, ComponentOps};
use super::pool::{ComponentPool, ErasedPool};
use super::signature::{Signature, MAX_COMPONENTS};
use crate::error::EcsError;

/// Everything the world keeps for one registered component type.
pub(crate) struct ComponentEntry {
    pub(crate) ops: Arc<dyn ComponentOps>,
    pub(crate) pool: Box<dyn ErasedPool>,
    /// Components auto-added alongside this one.
    pub(crate) dependents: Vec<String>,
    /// Built-in components are present on every entity and cannot be removed.
    pub(crate) builtin: bool,
}

/// The outcome of [`ComponentRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registration {
    /// A new bit was assigned.
    New(usize),
    /// The name was already registered; its pool was replaced by an empty one.
    Replaced(usize),
}

/// Assigns each component type a bit index and owns its pool.
///
/// Bits are handed out in registration order and never reused. A type is
/// reachable both by its `TypeId` and by its registered name, the latter
/// being what scene documents and reflection-driven callers use.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: Vec<ComponentEntry>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `T::NAME`.
    ///
    /// Registering a name that already exists keeps its bit but swaps in the
    /// new type's invoker and an empty pool, discarding the stored values.
    pub(crate) fn register<T: Component>(
        &mut self,
        dependents: &[&str],
        builtin: bool,
    ) -> Result<Registration, EcsError> {
        let ops: Arc<dyn ComponentOps> = Arc::new(ComponentInvoker::<T>::new());
        let entry = ComponentEntry {
            pool: ops.new_pool(),
            ops,
            dependents: dependents.iter().map(|name| (*name).to_owned()).collect(),
            builtin,
        };

        if let Some(&bit) = self.by_name.get(T::NAME) {
            let previous = std::mem::replace(&mut self.entries[bit], entry);
            self.by_type.remove(&previous.ops.component_type());
            self.by_type.insert(TypeId::of::<T>(), bit);
            return Ok(Registration::Replaced(bit));
        }

        if self.entries.len() >= MAX_COMPONENTS {
            return Err(EcsError::ComponentLimitReached { max: MAX_COMPONENTS });
        }
        let bit = self.entries.len();
        self.entries.push(entry);
        self.by_name.insert(T::NAME.to_owned(), bit);
        self.by_type.insert(TypeId::of::<T>(), bit);
        Ok(Registration::New(bit))
    }

    /// The bit assigned to `T`.
    pub fn bit_of<T: Component>(&self) -> Option<usize> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// The bit assigned to the component registered as `name`.
    pub fn bit_of_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// The signature requiring every named component.
    pub fn signature_of(&self, names: &[&str]) -> Result<Signature, EcsError> {
        names
            .iter()
            .map(|name| {
                self.bit_of_name(name)
                    .ok_or_else(|| EcsError::UnknownComponent((*name).to_owned()))
            })
            .collect()
    }

    /// The invoker of the component at `bit`.
    pub fn ops(&self, bit: usize) -> Option<&Arc<dyn ComponentOps>> {
        self.entries.get(bit).map(|entry| &entry.ops)
    }

    /// The registered name of the component at `bit`.
    pub fn name_of(&self, bit: usize) -> Option<&'static str> {
        self.entries.get(bit).map(|entry| entry.ops.name())
    }

    /// The number of registered component types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in bit order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.ops.name())
    }

    /// The typed pool of `T`.
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        let bit = self.bit_of::<T>()?;
        self.entries[bit]
            .pool
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    /// The typed pool of `T`, mutably.
    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        let bit = self.bit_of::<T>()?;
        self.entries[bit]
            .pool
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    /// The type-erased pool at `bit`.
    pub fn erased_pool(&self, bit: usize) -> Option<&dyn ErasedPool> {
        self.entries.get(bit).map(|entry| entry.pool.as_ref())
    }

    pub(crate) fn entry(&self, bit: usize) -> Option<&ComponentEntry> {
        self.entries.get(bit)
    }

    pub(crate) fn entry_mut(&mut self, bit: usize) -> Option<&mut ComponentEntry> {
        self.entries.get_mut(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Name, Transform};
    use ember_core::EntityId;

    #[test]
    fn bits_follow_registration_order() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(registry.register::<Name>(&[], true).unwrap(), Registration::New(0));
        assert_eq!(
            registry.register::<Transform>(&["Name"], true).unwrap(),
            Registration::New(1)
        );
        assert_eq!(registry.bit_of::<Transform>(), Some(1));
        assert_eq!(registry.bit_of_name("Name"), Some(0));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Name", "Transform"]);
        assert_eq!(
            registry.signature_of(&["Transform", "Name"]).unwrap(),
            Signature::from_bits([0, 1])
        );
        assert!(matches!(
            registry.signature_of(&["Velocity"]),
            Err(EcsError::UnknownComponent(name)) if name == "Velocity"
        ));
    }

    #[test]
    fn re_registering_discards_the_old_pool() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Name>(&[], false).unwrap();
        registry
            .pool_mut::<Name>()
            .unwrap()
            .insert(EntityId::new(0, 0), Name::default());

        assert_eq!(registry.register::<Name>(&[], false).unwrap(), Registration::Replaced(0));
        assert_eq!(registry.len(), 1);
        assert!(registry.pool::<Name>().unwrap().is_empty());
    }
}
