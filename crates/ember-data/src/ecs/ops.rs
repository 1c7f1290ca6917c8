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

//! Generic component actions dispatched without knowing the concrete type.
//!
//! Every registered component type gets one [`ComponentInvoker`], stored as an
//! `Arc<dyn ComponentOps>` next to its pool. Serialization, prefab sync and
//! tooling call through this interface using only the component's name or
//! bit index; the actions themselves are written once, on top of
//! [`Reflect`].

use ember_core::reflect::{Reflect, ReflectError};
use ember_core::EntityId;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::marker::PhantomData;

use super::component::Component;
use super::pool::{ComponentPool, ErasedPool};

/// Uniform operations over one component type's pool.
///
/// The pool argument must be the pool created by [`ComponentOps::new_pool`];
/// passing another pool makes every operation a no-op.
pub trait ComponentOps: Send + Sync {
    /// The registered component name.
    fn name(&self) -> &'static str;
    /// The concrete component type.
    fn component_type(&self) -> TypeId;
    /// The declared names of the reflected fields.
    fn field_names(&self) -> &'static [&'static str];
    /// Creates an empty pool for this type.
    fn new_pool(&self) -> Box<dyn ErasedPool>;

    /// Stores a default-constructed value. Returns `false` if one was present.
    fn add(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool;
    /// Stores a boxed value. An existing value only takes over the reflected
    /// fields, keeping its skipped ones. Returns `false` if the box does not
    /// hold this component type.
    fn insert_boxed(&self, pool: &mut dyn ErasedPool, id: EntityId, value: Box<dyn Any + Send>) -> bool;
    /// Drops the value of `id`. Returns `false` if there was none.
    fn remove(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool;
    /// Restores every reflected field to its default value.
    fn reset(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool;

    /// Saves the value of `id` as a JSON object.
    fn save(&self, pool: &dyn ErasedPool, id: EntityId) -> Option<Value>;
    /// Loads the value of `id` from a JSON object. `Ok(false)` if `id` has no value.
    fn load(&self, pool: &mut dyn ErasedPool, id: EntityId, value: &Value) -> Result<bool, ReflectError>;
    /// Field-wise equality of the values of `a` and `b`. `false` if either is missing.
    fn compare(&self, pool: &dyn ErasedPool, a: EntityId, b: EntityId) -> bool;
    /// Deep-copies the value of `source` into the existing value of `target`.
    fn duplicate(&self, pool: &mut dyn ErasedPool, source: EntityId, target: EntityId) -> bool;

    /// The value of `id` as a reflected object, for field enumeration.
    fn get<'p>(&self, pool: &'p dyn ErasedPool, id: EntityId) -> Option<&'p dyn Reflect>;
    /// Mutable counterpart of [`ComponentOps::get`].
    fn get_mut<'p>(&self, pool: &'p mut dyn ErasedPool, id: EntityId) -> Option<&'p mut dyn Reflect>;
}

/// The [`ComponentOps`] implementation for component type `T`.
pub struct ComponentInvoker<T>(PhantomData<fn() -> T>);

impl<T: Component> ComponentInvoker<T> {
    /// Creates the invoker for `T`.
    pub fn new() -> Self {
        Self(PhantomData)
    }

    fn typed(pool: &dyn ErasedPool) -> Option<&ComponentPool<T>> {
        pool.as_any().downcast_ref::<ComponentPool<T>>()
    }

    fn typed_mut(pool: &mut dyn ErasedPool) -> Option<&mut ComponentPool<T>> {
        pool.as_any_mut().downcast_mut::<ComponentPool<T>>()
    }
}

impl<T: Component> Default for ComponentInvoker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentOps for ComponentInvoker<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn field_names(&self) -> &'static [&'static str] {
        T::default().field_names()
    }

    fn new_pool(&self) -> Box<dyn ErasedPool> {
        Box::new(ComponentPool::<T>::new())
    }

    fn add(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool {
        match Self::typed_mut(pool) {
            Some(pool) if !pool.contains(id) => {
                pool.insert(id, T::default());
                true
            }
            _ => false,
        }
    }

    fn insert_boxed(&self, pool: &mut dyn ErasedPool, id: EntityId, value: Box<dyn Any + Send>) -> bool {
        let (Some(pool), Ok(value)) = (Self::typed_mut(pool), value.downcast::<T>()) else {
            return false;
        };
        match pool.get_mut(id) {
            Some(existing) => existing.duplicate_from(&*value),
            None => {
                pool.insert(id, *value);
                true
            }
        }
    }

    fn remove(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool {
        pool.remove_entity(id)
    }

    fn reset(&self, pool: &mut dyn ErasedPool, id: EntityId) -> bool {
        Self::typed_mut(pool)
            .and_then(|pool| pool.get_mut(id))
            .is_some_and(|value| value.duplicate_from(&T::default()))
    }

    fn save(&self, pool: &dyn ErasedPool, id: EntityId) -> Option<Value> {
        Self::typed(pool)?.get(id).map(Reflect::save)
    }

    fn load(&self, pool: &mut dyn ErasedPool, id: EntityId, value: &Value) -> Result<bool, ReflectError> {
        match Self::typed_mut(pool).and_then(|pool| pool.get_mut(id)) {
            Some(component) => component.load(value).map(|()| true),
            None => Ok(false),
        }
    }

    fn compare(&self, pool: &dyn ErasedPool, a: EntityId, b: EntityId) -> bool {
        let Some(pool) = Self::typed(pool) else {
            return false;
        };
        match (pool.get(a), pool.get(b)) {
            (Some(a), Some(b)) => a.reflect_eq(b),
            _ => false,
        }
    }

    fn duplicate(&self, pool: &mut dyn ErasedPool, source: EntityId, target: EntityId) -> bool {
        let Some(pool) = Self::typed_mut(pool) else {
            return false;
        };
        if source == target {
            return pool.contains(source);
        }
        match pool.pair_mut(source, target) {
            Some((src, dst)) => dst.duplicate_from(src),
            None => false,
        }
    }

    fn get<'p>(&self, pool: &'p dyn ErasedPool, id: EntityId) -> Option<&'p dyn Reflect> {
        Self::typed(pool)?.get(id).map(|value| value as &dyn Reflect)
    }

    fn get_mut<'p>(&self, pool: &'p mut dyn ErasedPool, id: EntityId) -> Option<&'p mut dyn Reflect> {
        Self::typed_mut(pool)?
            .get_mut(id)
            .map(|value| value as &mut dyn Reflect)
    }
}
