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

//! Implements Ember's **sparse-set ECS**.
//!
//! Every registered component type owns one [`ComponentPool`]: a dense array of
//! values plus an entity-to-slot index. An entity's [`Signature`] records which
//! pools hold a value for it, and systems subscribe to entities by testing
//! their signature against a required one. Subscriptions are maintained
//! incrementally on every structural change, never rebuilt per frame.
//!
//! The primary entry point for interacting with the ECS is the [`World`] struct.

mod commands;
mod component;
mod components;
mod entity;
mod ops;
mod pool;
mod registry;
mod signature;
mod system;
mod world;

pub use commands::{Command, CommandBuffer, SpawnHook};
pub use component::Component;
pub use components::*;
pub use ember_core::EntityId;
pub use entity::EntityRegistry;
pub use ops::{ComponentInvoker, ComponentOps};
pub use pool::{ComponentPool, ErasedPool};
pub use registry::ComponentRegistry;
pub use signature::{Signature, MAX_COMPONENTS};
pub use system::{GameState, StateMask, System, SystemContext, SystemRegistry};
pub use world::World;
pub(crate) use world::NAME_BIT;
