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

//! Scenes: named groups of entities that are loaded, activated and cleared
//! together, plus the transform hierarchy that links entities across them
//! and the prefab templates built on top.

mod document;
mod hierarchy;
mod prefab;

pub use document::EntityDocument;

use ember_core::EntityId;
use std::path::{Path, PathBuf};

use crate::ecs::World;

/// A named, ordered collection of entities.
///
/// Entities of an inactive scene keep all their component data but are not
/// matched by any system.
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) name: String,
    pub(crate) entities: Vec<EntityId>,
    pub(crate) active: bool,
    pub(crate) is_prefab: bool,
    /// The template root, for prefab scenes.
    pub(crate) prefab_root: Option<EntityId>,
    /// The file the scene was loaded from, if any.
    pub(crate) path: Option<PathBuf>,
}

impl Scene {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entities: Vec::new(),
            active: true,
            is_prefab: false,
            prefab_root: None,
            path: None,
        }
    }

    /// The scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scene's entities, in creation order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Returns true if the scene takes part in system dispatch.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true if the scene holds a prefab template.
    pub fn is_prefab(&self) -> bool {
        self.is_prefab
    }

    /// The template root of a prefab scene.
    pub fn prefab_root(&self) -> Option<EntityId> {
        self.prefab_root
    }

    /// The file the scene was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl World {
    /// Creates an empty, active scene.
    ///
    /// Returns `false` if a scene with that name already exists.
    pub fn create_scene(&mut self, name: &str) -> bool {
        if self.has_scene(name) {
            log::warn!("scene `{name}` already exists");
            return false;
        }
        self.scenes.push(Scene::new(name));
        log::debug!("created scene `{name}`");
        true
    }

    /// Returns true if a scene named `name` is loaded.
    pub fn has_scene(&self, name: &str) -> bool {
        self.scene_index(name).is_some()
    }

    /// Looks up a scene by name.
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.name == name)
    }

    pub(crate) fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|scene| scene.name == name)
    }

    pub(crate) fn scene_index(&self, name: &str) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.name == name)
    }

    /// Names of the loaded scenes, in creation order.
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(Scene::name).collect()
    }

    /// Activates or deactivates a scene, subscribing or unsubscribing all of
    /// its entities from the systems that match them.
    pub fn set_scene_active(&mut self, name: &str, active: bool) -> bool {
        let Some(scene) = self.scene_mut(name) else {
            log::warn!("cannot toggle unknown scene `{name}`");
            return false;
        };
        if scene.active == active {
            return true;
        }
        scene.active = active;
        let entities = scene.entities.clone();
        for id in entities {
            self.refresh_subscriptions(id);
        }
        log::debug!("scene `{name}` is now {}", if active { "active" } else { "inactive" });
        true
    }

    /// Moves `id` from scene `old` to scene `new`.
    ///
    /// Only the entity itself moves; its descendants are left where they are.
    pub fn swap_scenes(&mut self, old: &str, new: &str, id: EntityId) -> bool {
        if self.entities.scene_of(id) != Some(old) {
            log::warn!("entity {id} is not in scene `{old}`");
            return false;
        }
        if !self.has_scene(new) {
            log::warn!("cannot move entity {id} to unknown scene `{new}`");
            return false;
        }
        if old == new {
            return true;
        }

        if let Some(scene) = self.scene_mut(old) {
            scene.entities.retain(|entity| *entity != id);
        }
        if let Some(scene) = self.scene_mut(new) {
            scene.entities.push(id);
        }
        if let Some(record) = self.entities.record_mut(id) {
            record.scene = new.to_owned();
        }
        self.refresh_subscriptions(id);
        true
    }

    /// Deletes every entity of a scene, then the scene itself.
    ///
    /// Children living in other scenes are deleted along with their parents.
    pub fn clear_scene(&mut self, name: &str) -> bool {
        let Some(scene) = self.scene(name) else {
            log::warn!("cannot clear unknown scene `{name}`");
            return false;
        };
        let entities = scene.entities.clone();
        for id in entities {
            // Already gone if an earlier parent took it down.
            if self.is_valid_entity(id) {
                self.delete_entity(id);
            }
        }
        self.scenes.retain(|scene| scene.name != name);
        if self.prefab_edit.as_deref() == Some(name) {
            self.prefab_edit = None;
        }
        log::info!("cleared scene `{name}`");
        true
    }
}
