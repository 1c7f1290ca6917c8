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

//! Systems, game states, and the signature-matched subscriber caches.

use ember_core::reflect::Reflect;
use ember_core::math::Mat4;
use ember_core::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::commands::CommandBuffer;
use super::component::Component;
use super::signature::Signature;
use super::world::World;
use crate::error::EcsError;

/// The global simulation state.
///
/// A change requested with [`World::set_state`] is applied at the start of
/// the next tick. `Start` becomes `Running` once a tick has run in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// The first tick after (re)starting.
    #[default]
    Start,
    /// Normal simulation.
    Running,
    /// Simulation halted, e.g. paused by the player.
    Stop,
    /// Waiting on something outside the simulation, e.g. an unfocused window.
    Wait,
    /// The loop should exit; [`World::tick`] returns `false`.
    Terminate,
}

impl GameState {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// The set of game states in which a system runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateMask(u8);

impl StateMask {
    /// Every state.
    pub const ALL: Self = Self(0b1_1111);

    /// The mask of the listed states, or [`StateMask::ALL`] if none is listed.
    pub fn from_states(states: &[GameState]) -> Self {
        if states.is_empty() {
            return Self::ALL;
        }
        Self(states.iter().fold(0, |mask, state| mask | state.bit()))
    }

    /// Returns true if systems with this mask run in `state`.
    pub fn contains(&self, state: GameState) -> bool {
        self.0 & state.bit() != 0
    }
}

impl Default for StateMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// A unit of logic run once per active scene on every tick.
///
/// A system is handed the entities of that scene whose signature contains
/// its required components. Structural changes (spawning, deleting, adding
/// or removing components, reparenting) are queued on
/// [`SystemContext::commands`] and applied as soon as the update returns.
pub trait System: 'static {
    /// Called once, before the first update.
    fn init(&mut self, _world: &mut World) {}

    /// Called for each active scene, with the matched entities of that scene.
    fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &[EntityId]);
}

/// What a system can reach while it updates.
///
/// Component values can be read and written freely. The set of entities and
/// the components they own cannot change until the update returns.
pub struct SystemContext<'w> {
    world: &'w mut World,
    commands: &'w mut CommandBuffer,
    scene: &'w str,
    delta_time: f32,
}

impl<'w> SystemContext<'w> {
    pub(crate) fn new(world: &'w mut World, commands: &'w mut CommandBuffer, scene: &'w str, delta_time: f32) -> Self {
        Self {
            world,
            commands,
            scene,
            delta_time,
        }
    }

    /// Seconds since the previous tick.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// The scene being updated.
    pub fn scene(&self) -> &str {
        self.scene
    }

    /// The current game state.
    pub fn state(&self) -> GameState {
        self.world.state()
    }

    /// Read-only access to the whole world.
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// The structural changes to apply after this update.
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut *self.commands
    }

    /// Gets an immutable reference to a component.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.world.get::<T>(id)
    }

    /// Gets a mutable reference to a component.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.world.get_mut::<T>(id)
    }

    /// Returns true if `id` owns a `T`.
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.world.has_component::<T>(id)
    }

    /// A component looked up by its registered name.
    pub fn component(&self, id: EntityId, name: &str) -> Option<&dyn Reflect> {
        self.world.component(id, name)
    }

    /// A component looked up by its registered name, mutably.
    pub fn component_mut(&mut self, id: EntityId, name: &str) -> Option<&mut dyn Reflect> {
        self.world.component_mut(id, name)
    }

    /// The world matrix of `id` as of the start of this tick.
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.world.world_matrix(id)
    }
}

pub(crate) struct SystemEntry {
    /// `None` while the system is running.
    pub(crate) system: Option<Box<dyn System>>,
    pub(crate) required: Signature,
    pub(crate) states: StateMask,
    /// Matched entities from active scenes.
    pub(crate) entities: BTreeSet<EntityId>,
    pub(crate) initialized: bool,
}

impl SystemEntry {
    fn evaluate(&mut self, id: EntityId, signature: &Signature, active: bool) {
        if active && signature.contains_all(&self.required) {
            self.entities.insert(id);
        } else {
            self.entities.remove(&id);
        }
    }
}

/// Registered systems, keyed and ordered by type name.
#[derive(Default)]
pub struct SystemRegistry {
    systems: BTreeMap<&'static str, SystemEntry>,
}

impl SystemRegistry {
    pub(crate) fn insert(
        &mut self,
        name: &'static str,
        system: Box<dyn System>,
        required: Signature,
        states: StateMask,
    ) -> Result<(), EcsError> {
        if self.systems.contains_key(name) {
            return Err(EcsError::DuplicateSystem(name));
        }
        self.systems.insert(
            name,
            SystemEntry {
                system: Some(system),
                required,
                states,
                entities: BTreeSet::new(),
                initialized: false,
            },
        );
        Ok(())
    }

    /// Re-tests `id` against every system.
    pub(crate) fn evaluate(&mut self, id: EntityId, signature: &Signature, active: bool) {
        for entry in self.systems.values_mut() {
            entry.evaluate(id, signature, active);
        }
    }

    pub(crate) fn evaluate_one(&mut self, name: &str, id: EntityId, signature: &Signature, active: bool) {
        if let Some(entry) = self.systems.get_mut(name) {
            entry.evaluate(id, signature, active);
        }
    }

    /// Drops `id` from every cache.
    pub(crate) fn forget(&mut self, id: EntityId) {
        for entry in self.systems.values_mut() {
            entry.entities.remove(&id);
        }
    }

    pub(crate) fn entry_mut(&mut self, name: &str) -> Option<&mut SystemEntry> {
        self.systems.get_mut(name)
    }

    pub(crate) fn uninitialized(&self) -> Vec<&'static str> {
        self.systems
            .iter()
            .filter(|(_, entry)| !entry.initialized)
            .map(|(name, _)| *name)
            .collect()
    }

    /// The entities currently matched by the system registered as `name`.
    pub fn subscribers(&self, name: &str) -> Option<&BTreeSet<EntityId>> {
        self.systems.get(name).map(|entry| &entry.entities)
    }

    /// The required signature of the system registered as `name`.
    pub fn required(&self, name: &str) -> Option<Signature> {
        self.systems.get(name).map(|entry| entry.required)
    }

    /// System names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.keys().copied()
    }

    /// The number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if no system is registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
