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

use ember_core::reflect::{Reflect, ReflectError};
use ember_core::{EntityId, Guid};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

use super::commands::CommandBuffer;
use super::component::Component;
use super::components::{Name, Transform};
use super::entity::EntityRegistry;
use super::ops::ComponentOps;
use super::registry::{ComponentRegistry, Registration};
use super::signature::Signature;
use super::system::{GameState, StateMask, System, SystemContext, SystemRegistry};
use crate::config::WorldConfig;
use crate::error::EcsError;
use crate::scene::Scene;

/// Bit of the built-in [`Name`] component.
pub(crate) const NAME_BIT: usize = 0;
/// Bit of the built-in [`Transform`] component.
pub(crate) const TRANSFORM_BIT: usize = 1;

/// The central container for the entire ECS, holding all entities, components,
/// systems and scenes.
///
/// Every entity belongs to exactly one scene and always owns a [`Name`] and a
/// [`Transform`]. Structural changes made directly on the world take effect
/// immediately; systems queue theirs through a
/// [`CommandBuffer`](super::CommandBuffer).
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) entities: EntityRegistry,
    pub(crate) components: ComponentRegistry,
    pub(crate) systems: SystemRegistry,
    /// Loaded scenes, in creation order.
    pub(crate) scenes: Vec<Scene>,
    pub(crate) state: GameState,
    pub(crate) pending_state: Option<GameState>,
    /// The prefab scene currently opened for editing.
    pub(crate) prefab_edit: Option<String>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Creates a world with the built-in components registered.
    pub fn new(config: WorldConfig) -> Self {
        let mut components = ComponentRegistry::new();
        let builtins = components
            .register::<Name>(&[], true)
            .and_then(|_| components.register::<Transform>(&[], true));
        if let Err(err) = builtins {
            log::error!("failed to register built-in components: {err}");
        }

        let mut world = Self {
            entities: EntityRegistry::new(config.max_entities),
            components,
            systems: SystemRegistry::default(),
            scenes: Vec::new(),
            state: config.initial_state,
            pending_state: None,
            prefab_edit: None,
            config,
        };
        if let Some(scene) = world.config.default_scene.clone() {
            world.create_scene(&scene);
        }
        world
    }

    /// The configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // --- Registration ---

    /// Registers `T` under `T::NAME`.
    ///
    /// `dependents` names components that are added along with `T` whenever
    /// an entity lacking them receives a `T`. Registering a name again
    /// replaces the type behind it and discards every stored value; entities
    /// that owned the old component lose it.
    pub fn register_component<T: Component>(&mut self, dependents: &[&str]) -> Result<(), EcsError> {
        if let Some(bit) = self.components.bit_of_name(T::NAME) {
            if self.components.entry(bit).is_some_and(|entry| entry.builtin) {
                log::warn!("`{}` is a built-in component and cannot be re-registered", T::NAME);
                return Ok(());
            }
        }

        match self.components.register::<T>(dependents, false)? {
            Registration::New(bit) => log::debug!("registered component `{}` at bit {bit}", T::NAME),
            Registration::Replaced(bit) => {
                log::info!("re-registered component `{}`, discarding its stored values", T::NAME);
                let owners: Vec<EntityId> = self
                    .entities
                    .iter()
                    .filter(|id| self.has_bit(*id, bit))
                    .collect();
                for id in owners {
                    if let Some(signature) = self.entities.signature_mut(id) {
                        signature.clear(bit);
                    }
                    self.refresh_subscriptions(id);
                }
            }
        }
        Ok(())
    }

    /// Registers a system.
    ///
    /// The system matches entities owning every component in `required`, and
    /// runs only in the listed `states` (every state if the list is empty).
    /// Systems are keyed by type name, which also fixes their dispatch order.
    pub fn register_system<S: System>(
        &mut self,
        system: S,
        required: &[&str],
        states: &[GameState],
    ) -> Result<(), EcsError> {
        let signature = self.components.signature_of(required)?;
        let name = std::any::type_name::<S>();
        self.systems
            .insert(name, Box::new(system), signature, StateMask::from_states(states))?;
        log::debug!("registered system `{name}` requiring {required:?}");

        let existing: Vec<EntityId> = self.entities.iter().collect();
        for id in existing {
            let active = self.is_entity_active(id);
            if let Some(signature) = self.entities.signature(id) {
                self.systems.evaluate_one(name, id, &signature, active);
            }
        }
        Ok(())
    }

    /// The component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The system registry.
    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    /// Registered system names, in dispatch order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.names().collect()
    }

    /// The entities currently matched by system `S`.
    pub fn system_entities<S: System>(&self) -> Vec<EntityId> {
        self.systems
            .subscribers(std::any::type_name::<S>())
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    // --- Entities ---

    /// Creates an entity in `scene`, with a fresh GUID and default
    /// [`Name`] and [`Transform`].
    ///
    /// Fails if the scene does not exist or the entity capacity is exhausted.
    pub fn create_entity(&mut self, scene: &str) -> Result<EntityId, EcsError> {
        let Some(scene_index) = self.scene_index(scene) else {
            log::error!("cannot create an entity in unknown scene `{scene}`");
            return Err(EcsError::UnknownScene(scene.to_owned()));
        };
        let id = self.entities.allocate(scene)?;
        self.scenes[scene_index].entities.push(id);

        self.attach(id, NAME_BIT);
        self.attach(id, TRANSFORM_BIT);
        if let Some(name) = self.get_mut::<Name>(id) {
            name.guid = Guid::new_v4();
        }
        Ok(id)
    }

    /// Deletes an entity, its children first.
    ///
    /// Returns `false` if `id` is not alive.
    pub fn delete_entity(&mut self, id: EntityId) -> bool {
        if !self.is_valid_entity(id) {
            log::debug!("ignoring deletion of dead entity {id}");
            return false;
        }

        self.unlink_parent(id);
        let children = self.children_of(id).to_vec();
        for child in children {
            self.delete_entity(child);
        }

        if let Some(signature) = self.entities.signature(id) {
            for bit in signature.iter() {
                if let Some(entry) = self.components.entry_mut(bit) {
                    entry.pool.remove_entity(id);
                }
            }
        }
        self.systems.forget(id);

        if let Some(scene) = self.entities.scene_of(id).map(str::to_owned) {
            if let Some(scene) = self.scene_mut(&scene) {
                scene.entities.retain(|entity| *entity != id);
            }
        }
        self.entities.free(id)
    }

    /// Deep-copies an entity and its whole subtree into `scene`, or into the
    /// source's scene when `None`.
    ///
    /// The copy keeps the source's parent when it lands in the parent's scene.
    pub fn duplicate_entity(&mut self, id: EntityId, scene: Option<&str>) -> Result<EntityId, EcsError> {
        let Some(source_scene) = self.entities.scene_of(id) else {
            return Err(EcsError::InvalidEntity(id));
        };
        let scene = scene.unwrap_or(source_scene).to_owned();
        if !self.has_scene(&scene) {
            return Err(EcsError::UnknownScene(scene));
        }

        let copy = self.duplicate_subtree(id, &scene)?;
        if let Some(parent) = self.parent_of(id) {
            if self.entities.scene_of(parent) == Some(scene.as_str()) {
                self.set_parent(parent, copy, false);
            }
        }
        self.update_world_matrices(copy);
        Ok(copy)
    }

    fn duplicate_subtree(&mut self, source: EntityId, scene: &str) -> Result<EntityId, EcsError> {
        // Taken before creating anything, so copying an entity into its own
        // subtree cannot pick up the copies.
        let children = self.children_of(source).to_vec();
        let copy = self.create_entity(scene)?;
        self.copy_components(source, copy);
        for child in children {
            let child_copy = self.duplicate_subtree(child, scene)?;
            self.set_parent(copy, child_copy, false);
        }
        Ok(copy)
    }

    /// Duplicates every component `source` owns onto `target`.
    pub(crate) fn copy_components(&mut self, source: EntityId, target: EntityId) {
        let Some(signature) = self.entities.signature(source) else {
            return;
        };
        for bit in signature.iter() {
            self.duplicate_bit(bit, source, target);
        }
    }

    /// Returns true if `id` is alive, generation included.
    pub fn is_valid_entity(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    /// The components owned by `id`.
    pub fn entity_signature(&self, id: EntityId) -> Option<Signature> {
        self.entities.signature(id)
    }

    /// The scene `id` belongs to.
    pub fn scene_of(&self, id: EntityId) -> Option<&str> {
        self.entities.scene_of(id)
    }

    /// The number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates over live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    /// The GUID stored in `id`'s [`Name`].
    pub fn guid_of(&self, id: EntityId) -> Option<Guid> {
        self.get::<Name>(id).map(|name| name.guid)
    }

    /// Finds the live entity carrying `guid`.
    pub fn find_by_guid(&self, guid: Guid) -> Option<EntityId> {
        self.components
            .pool::<Name>()?
            .iter()
            .find_map(|(id, name)| (name.guid == guid).then_some(id))
    }

    // --- Typed component access ---

    /// Adds a default `T` to `id` and returns it.
    ///
    /// If `id` already owns a `T`, a warning is logged and the existing value
    /// is returned. Missing dependents of `T` are added as well.
    pub fn add_component<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let bit = self.typed_bit::<T>(id)?;
        if self.has_bit(id, bit) {
            log::warn!("entity {id} already owns `{}`", T::NAME);
        } else {
            self.attach(id, bit);
        }
        self.get_mut::<T>(id)
    }

    /// Sets `id`'s `T` to `value`, adding the component first if missing.
    ///
    /// The reflected fields of `value` are copied; fields marked
    /// `#[reflect(skip)]` on an existing value are kept, so inserting a
    /// [`Transform`] leaves the hierarchy intact.
    pub fn insert_component<T: Component>(&mut self, id: EntityId, value: T) -> Option<&mut T> {
        let bit = self.typed_bit::<T>(id)?;
        self.attach(id, bit);
        let slot = self.get_mut::<T>(id)?;
        slot.duplicate_from(&value);
        Some(slot)
    }

    /// Removes `T` from `id`.
    ///
    /// Returns `false`, with a warning, if `id` has no `T` or `T` is built-in.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> bool {
        match self.components.bit_of::<T>() {
            Some(bit) => self.remove_bit(id, bit),
            None => {
                log::warn!("component `{}` is not registered", T::NAME);
                false
            }
        }
    }

    /// Gets an immutable reference to a component.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.components.pool::<T>()?.get(id)
    }

    /// Gets a mutable reference to a component.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.components.pool_mut::<T>()?.get_mut(id)
    }

    /// Returns true if `id` owns a `T`.
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.components
            .pool::<T>()
            .is_some_and(|pool| pool.contains(id))
    }

    fn typed_bit<T: Component>(&self, id: EntityId) -> Option<usize> {
        let Some(bit) = self.components.bit_of::<T>() else {
            log::warn!("component `{}` is not registered", T::NAME);
            return None;
        };
        if !self.is_valid_entity(id) {
            log::warn!("entity {id} is not alive");
            return None;
        }
        Some(bit)
    }

    // --- Component access by name ---

    /// The bit assigned to the component registered as `name`.
    pub fn component_bit(&self, name: &str) -> Option<usize> {
        self.components.bit_of_name(name)
    }

    /// The invoker of the component registered as `name`.
    pub fn component_ops(&self, name: &str) -> Option<Arc<dyn ComponentOps>> {
        let bit = self.components.bit_of_name(name)?;
        self.components.ops(bit).cloned()
    }

    /// Registered component names, in bit order.
    pub fn registered_components(&self) -> Vec<&'static str> {
        self.components.names().collect()
    }

    /// The names of the components `id` owns, in bit order.
    pub fn component_names(&self, id: EntityId) -> Vec<&'static str> {
        self.entities
            .signature(id)
            .map(|signature| {
                signature
                    .iter()
                    .filter_map(|bit| self.components.name_of(bit))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of the components in `signature`.
    pub fn names_in(&self, signature: &Signature) -> Vec<&'static str> {
        signature
            .iter()
            .filter_map(|bit| self.components.name_of(bit))
            .collect()
    }

    /// Adds a default value of the component registered as `name`.
    ///
    /// Returns `false` if the name is unknown or the entity is dead. Adding a
    /// component the entity already owns logs a warning and returns `true`.
    pub fn add_component_by_name(&mut self, id: EntityId, name: &str) -> bool {
        let Some(bit) = self.named_bit(name) else {
            return false;
        };
        if !self.is_valid_entity(id) {
            log::warn!("cannot add `{name}` to dead entity {id}");
            return false;
        }
        if self.has_bit(id, bit) {
            log::warn!("entity {id} already owns `{name}`");
            return true;
        }
        self.attach(id, bit)
    }

    /// Removes the component registered as `name`.
    pub fn remove_component_by_name(&mut self, id: EntityId, name: &str) -> bool {
        match self.named_bit(name) {
            Some(bit) => self.remove_bit(id, bit),
            None => false,
        }
    }

    /// Returns true if the pool of the component registered as `name` holds a
    /// value for `id`.
    pub fn has_component_by_name(&self, id: EntityId, name: &str) -> bool {
        self.components
            .bit_of_name(name)
            .and_then(|bit| self.components.erased_pool(bit))
            .is_some_and(|pool| pool.contains(id))
    }

    /// A component looked up by its registered name.
    pub fn component(&self, id: EntityId, name: &str) -> Option<&dyn Reflect> {
        let entry = self.components.entry(self.components.bit_of_name(name)?)?;
        entry.ops.get(entry.pool.as_ref(), id)
    }

    /// A component looked up by its registered name, mutably.
    pub fn component_mut(&mut self, id: EntityId, name: &str) -> Option<&mut dyn Reflect> {
        let bit = self.components.bit_of_name(name)?;
        let entry = self.components.entry_mut(bit)?;
        entry.ops.get_mut(entry.pool.as_mut(), id)
    }

    /// Restores every reflected field of the named component to its default.
    pub fn reset_component(&mut self, id: EntityId, name: &str) -> bool {
        let Some(bit) = self.named_bit(name) else {
            return false;
        };
        match self.components.entry_mut(bit) {
            Some(entry) => entry.ops.reset(entry.pool.as_mut(), id),
            None => false,
        }
    }

    /// Saves the named component of `id` as a JSON object.
    pub fn save_component(&self, id: EntityId, name: &str) -> Option<Value> {
        let entry = self.components.entry(self.components.bit_of_name(name)?)?;
        entry.ops.save(entry.pool.as_ref(), id)
    }

    /// Loads the named component of `id` from a JSON object, adding the
    /// component first if `id` lacks it.
    pub fn load_component(&mut self, id: EntityId, name: &str, value: &Value) -> Result<(), EcsError> {
        let bit = self
            .components
            .bit_of_name(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_owned()))?;
        if !self.is_valid_entity(id) {
            return Err(EcsError::InvalidEntity(id));
        }
        self.attach(id, bit);
        self.load_bit(bit, id, value)?;
        Ok(())
    }

    /// Field-wise equality of the named component on `a` and `b`.
    pub fn compare_component(&self, name: &str, a: EntityId, b: EntityId) -> bool {
        self.components
            .bit_of_name(name)
            .is_some_and(|bit| self.compare_bit(bit, a, b))
    }

    /// Deep-copies the named component from `source` onto `target`, adding
    /// it to `target` first if missing.
    pub fn duplicate_component(&mut self, name: &str, source: EntityId, target: EntityId) -> bool {
        match self.named_bit(name) {
            Some(bit) => self.duplicate_bit(bit, source, target),
            None => false,
        }
    }

    /// Sets a component from a boxed value, adding it first if missing.
    pub(crate) fn insert_boxed(&mut self, id: EntityId, name: &str, value: Box<dyn Any + Send>) -> bool {
        let Some(bit) = self.named_bit(name) else {
            return false;
        };
        if !self.is_valid_entity(id) {
            return false;
        }
        self.attach(id, bit);
        match self.components.entry_mut(bit) {
            Some(entry) => entry.ops.insert_boxed(entry.pool.as_mut(), id, value),
            None => false,
        }
    }

    fn named_bit(&self, name: &str) -> Option<usize> {
        let bit = self.components.bit_of_name(name);
        if bit.is_none() {
            log::warn!("component `{name}` is not registered");
        }
        bit
    }

    // --- Bit-level operations shared by the typed, named and scene APIs ---

    pub(crate) fn has_bit(&self, id: EntityId, bit: usize) -> bool {
        self.entities
            .signature(id)
            .is_some_and(|signature| signature.is_set(bit))
    }

    /// Adds the default value of the component at `bit`, then its missing
    /// dependents. Returns `false` if `id` is dead or already owns it.
    pub(crate) fn attach(&mut self, id: EntityId, bit: usize) -> bool {
        let Some(signature) = self.entities.signature_mut(id) else {
            return false;
        };
        if signature.is_set(bit) {
            return false;
        }
        let Some(entry) = self.components.entry_mut(bit) else {
            return false;
        };
        entry.ops.add(entry.pool.as_mut(), id);
        signature.set(bit);
        let component = entry.ops.name();
        let dependents = entry.dependents.clone();
        self.refresh_subscriptions(id);

        for dependent in dependents {
            match self.components.bit_of_name(&dependent) {
                Some(dependent_bit) => {
                    self.attach(id, dependent_bit);
                }
                None => log::warn!("dependent `{dependent}` of `{component}` is not registered"),
            }
        }
        true
    }

    /// Drops the component at `bit`. Returns `false` if `id` does not own it.
    pub(crate) fn detach(&mut self, id: EntityId, bit: usize) -> bool {
        let Some(signature) = self.entities.signature_mut(id) else {
            return false;
        };
        if !signature.is_set(bit) {
            return false;
        }
        if let Some(entry) = self.components.entry_mut(bit) {
            entry.pool.remove_entity(id);
        }
        signature.clear(bit);
        self.refresh_subscriptions(id);
        true
    }

    fn remove_bit(&mut self, id: EntityId, bit: usize) -> bool {
        let Some(entry) = self.components.entry(bit) else {
            return false;
        };
        let name = entry.ops.name();
        if entry.builtin {
            log::warn!("`{name}` is built in and cannot be removed from {id}");
            return false;
        }
        if !self.has_bit(id, bit) {
            log::warn!("entity {id} has no `{name}` to remove");
            return false;
        }
        self.detach(id, bit)
    }

    pub(crate) fn compare_bit(&self, bit: usize, a: EntityId, b: EntityId) -> bool {
        self.components
            .entry(bit)
            .is_some_and(|entry| entry.ops.compare(entry.pool.as_ref(), a, b))
    }

    /// Copies the component at `bit` from `source` to `target`, adding it to
    /// `target` first if needed.
    pub(crate) fn duplicate_bit(&mut self, bit: usize, source: EntityId, target: EntityId) -> bool {
        if !self.has_bit(source, bit) || !self.is_valid_entity(target) {
            return false;
        }
        self.attach(target, bit);
        match self.components.entry_mut(bit) {
            Some(entry) => entry.ops.duplicate(entry.pool.as_mut(), source, target),
            None => false,
        }
    }

    pub(crate) fn load_bit(&mut self, bit: usize, id: EntityId, value: &Value) -> Result<bool, ReflectError> {
        match self.components.entry_mut(bit) {
            Some(entry) => entry.ops.load(entry.pool.as_mut(), id, value),
            None => Ok(false),
        }
    }

    // --- Subscriptions ---

    fn is_entity_active(&self, id: EntityId) -> bool {
        self.entities
            .scene_of(id)
            .and_then(|scene| self.scene(scene))
            .is_some_and(Scene::is_active)
    }

    /// Re-tests `id` against every system.
    pub(crate) fn refresh_subscriptions(&mut self, id: EntityId) {
        match self.entities.signature(id) {
            Some(signature) => {
                let active = self.is_entity_active(id);
                self.systems.evaluate(id, &signature, active);
            }
            None => self.systems.forget(id),
        }
    }

    // --- Game loop ---

    /// The current game state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Requests a state change, applied at the start of the next tick.
    pub fn set_state(&mut self, state: GameState) {
        self.pending_state = Some(state);
    }

    /// Runs `init` on every system that has not been initialised yet.
    pub fn init_systems(&mut self) {
        for name in self.systems.uninitialized() {
            let Some(mut system) = self.systems.entry_mut(name).and_then(|entry| entry.system.take())
            else {
                continue;
            };
            system.init(self);
            if let Some(entry) = self.systems.entry_mut(name) {
                entry.system = Some(system);
                entry.initialized = true;
            }
        }
    }

    /// Advances the simulation by one tick.
    ///
    /// Applies any pending state change, propagates transforms, then runs
    /// every system whose state mask includes the current state once per
    /// active scene, in type-name order. Returns `false` once the state is
    /// [`GameState::Terminate`].
    pub fn tick(&mut self, delta_time: f32) -> bool {
        if let Some(next) = self.pending_state.take() {
            if next != self.state {
                log::info!("game state {:?} -> {:?}", self.state, next);
            }
            self.state = next;
        }
        if self.state == GameState::Terminate {
            return false;
        }

        self.init_systems();
        self.propagate_transforms();

        let scenes: Vec<String> = self
            .scenes
            .iter()
            .filter(|scene| scene.is_active())
            .map(|scene| scene.name().to_owned())
            .collect();
        let systems: Vec<&'static str> = self.systems.names().collect();
        for scene in &scenes {
            for name in &systems {
                if self.scene(scene).is_some_and(Scene::is_active) {
                    self.run_system(name, scene, delta_time);
                }
            }
        }

        if self.state == GameState::Start {
            self.state = GameState::Running;
        }
        true
    }

    fn run_system(&mut self, name: &str, scene: &str, delta_time: f32) {
        let Some(entry) = self.systems.entry_mut(name) else {
            return;
        };
        if !entry.states.contains(self.state) {
            return;
        }
        let Some(mut system) = entry.system.take() else {
            return;
        };
        let entities: Vec<EntityId> = entry
            .entities
            .iter()
            .copied()
            .filter(|id| self.entities.scene_of(*id) == Some(scene))
            .collect();

        let mut commands = CommandBuffer::new();
        {
            let mut ctx = SystemContext::new(self, &mut commands, scene, delta_time);
            system.update(&mut ctx, &entities);
        }
        if let Some(entry) = self.systems.entry_mut(name) {
            entry.system = Some(system);
        }
        commands.apply(self);
    }

    /// Applies a command buffer recorded outside of a system.
    pub fn apply_commands(&mut self, commands: CommandBuffer) {
        commands.apply(self);
    }
}
