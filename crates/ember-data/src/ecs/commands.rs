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

//! Deferred structural changes.
//!
//! Systems cannot add or remove entities or components while their matched
//! entity list is being walked. They record the change as a [`Command`]
//! instead; the world applies the buffer, in recording order, right after the
//! system's update returns.

use ember_core::EntityId;
use std::any::Any;
use std::fmt;

use super::component::Component;
use super::world::World;

/// A callback run on an entity spawned by a [`Command::Spawn`].
pub type SpawnHook = Box<dyn FnOnce(&mut World, EntityId) + Send>;

/// A deferred change to the world's structure.
pub enum Command {
    /// Creates an entity in `scene`, then runs `then` on it.
    Spawn {
        scene: String,
        then: Option<SpawnHook>,
    },
    /// Deletes an entity and its children.
    Despawn { entity: EntityId },
    /// Adds a default-valued component.
    Add { entity: EntityId, component: String },
    /// Adds a component (if missing) and sets its value.
    Insert {
        entity: EntityId,
        component: &'static str,
        value: Box<dyn Any + Send>,
    },
    /// Removes a component.
    Remove { entity: EntityId, component: String },
    /// Attaches `child` under `parent`.
    SetParent {
        parent: EntityId,
        child: EntityId,
        update_transform: bool,
    },
    /// Detaches `child` from its parent.
    RemoveParent { child: EntityId },
    /// Deep-copies an entity and its children.
    Duplicate {
        entity: EntityId,
        scene: Option<String>,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { scene, .. } => write!(f, "Spawn({scene})"),
            Self::Despawn { entity } => write!(f, "Despawn({entity})"),
            Self::Add { entity, component } => write!(f, "Add({entity}, {component})"),
            Self::Insert { entity, component, .. } => write!(f, "Insert({entity}, {component})"),
            Self::Remove { entity, component } => write!(f, "Remove({entity}, {component})"),
            Self::SetParent { parent, child, .. } => write!(f, "SetParent({parent}, {child})"),
            Self::RemoveParent { child } => write!(f, "RemoveParent({child})"),
            Self::Duplicate { entity, .. } => write!(f, "Duplicate({entity})"),
        }
    }
}

/// An ordered list of [`Command`]s.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an arbitrary command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Queues the creation of an entity in `scene`.
    pub fn spawn(&mut self, scene: impl Into<String>) {
        self.push(Command::Spawn {
            scene: scene.into(),
            then: None,
        });
    }

    /// Queues the creation of an entity in `scene` and a callback configuring it.
    pub fn spawn_with(
        &mut self,
        scene: impl Into<String>,
        then: impl FnOnce(&mut World, EntityId) + Send + 'static,
    ) {
        self.push(Command::Spawn {
            scene: scene.into(),
            then: Some(Box::new(then)),
        });
    }

    /// Queues the deletion of `entity`.
    pub fn despawn(&mut self, entity: EntityId) {
        self.push(Command::Despawn { entity });
    }

    /// Queues adding a default `T` to `entity`.
    pub fn add<T: Component>(&mut self, entity: EntityId) {
        self.add_by_name(entity, T::NAME);
    }

    /// Queues adding the component registered as `component`.
    pub fn add_by_name(&mut self, entity: EntityId, component: &str) {
        self.push(Command::Add {
            entity,
            component: component.to_owned(),
        });
    }

    /// Queues setting `entity`'s `T` to `value`, adding it if missing.
    pub fn insert<T: Component>(&mut self, entity: EntityId, value: T) {
        self.push(Command::Insert {
            entity,
            component: T::NAME,
            value: Box::new(value),
        });
    }

    /// Queues removing `T` from `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        self.remove_by_name(entity, T::NAME);
    }

    /// Queues removing the component registered as `component`.
    pub fn remove_by_name(&mut self, entity: EntityId, component: &str) {
        self.push(Command::Remove {
            entity,
            component: component.to_owned(),
        });
    }

    /// Queues attaching `child` under `parent`.
    pub fn set_parent(&mut self, parent: EntityId, child: EntityId, update_transform: bool) {
        self.push(Command::SetParent {
            parent,
            child,
            update_transform,
        });
    }

    /// Queues detaching `child` from its parent.
    pub fn remove_parent(&mut self, child: EntityId) {
        self.push(Command::RemoveParent { child });
    }

    /// Queues a deep copy of `entity`, into `scene` or its own scene.
    pub fn duplicate(&mut self, entity: EntityId, scene: Option<&str>) {
        self.push(Command::Duplicate {
            entity,
            scene: scene.map(str::to_owned),
        });
    }

    /// The number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Applies every command in recording order.
    ///
    /// A command that fails is logged and skipped; the rest still run.
    pub fn apply(self, world: &mut World) {
        for command in self.commands {
            log::trace!("applying {command:?}");
            match command {
                Command::Spawn { scene, then } => match world.create_entity(&scene) {
                    Ok(entity) => {
                        if let Some(then) = then {
                            then(world, entity);
                        }
                    }
                    Err(err) => log::error!("deferred spawn in `{scene}` failed: {err}"),
                },
                Command::Despawn { entity } => {
                    if !world.delete_entity(entity) {
                        log::warn!("deferred despawn of {entity} ignored, entity is not alive");
                    }
                }
                Command::Add { entity, component } => {
                    world.add_component_by_name(entity, &component);
                }
                Command::Insert {
                    entity,
                    component,
                    value,
                } => {
                    if !world.insert_boxed(entity, component, value) {
                        log::warn!("deferred insert of `{component}` on {entity} ignored");
                    }
                }
                Command::Remove { entity, component } => {
                    world.remove_component_by_name(entity, &component);
                }
                Command::SetParent {
                    parent,
                    child,
                    update_transform,
                } => {
                    world.set_parent(parent, child, update_transform);
                }
                Command::RemoveParent { child } => {
                    world.remove_parent(child);
                }
                Command::Duplicate { entity, scene } => {
                    if let Err(err) = world.duplicate_entity(entity, scene.as_deref()) {
                        log::error!("deferred duplicate of {entity} failed: {err}");
                    }
                }
            }
        }
    }
}
