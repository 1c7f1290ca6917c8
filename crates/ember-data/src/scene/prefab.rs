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

//! Prefab templates and the deep sync that keeps instances equal to them.

use std::path::Path;

use ember_core::EntityId;

use crate::ecs::{Name, Signature, World, NAME_BIT};
use crate::error::EcsError;

impl World {
    /// Loads a prefab file as an inactive template scene named after the
    /// file stem. Returns the scene name.
    ///
    /// The file must contain at least one root; if it contains several, the
    /// first becomes the template and the others are ignored.
    pub fn load_prefab(&mut self, path: impl AsRef<Path>) -> Result<String, EcsError> {
        let name = self.load_scene(path, None)?;
        let Some(roots) = self.scene(&name).map(|scene| {
            scene
                .entities()
                .iter()
                .copied()
                .filter(|id| self.parent_of(*id).is_none())
                .collect::<Vec<_>>()
        }) else {
            return Err(EcsError::UnknownScene(name));
        };

        let Some(&root) = roots.first() else {
            self.clear_scene(&name);
            return Err(EcsError::InvalidPrefab {
                name,
                reason: "the document has no root entity".to_owned(),
            });
        };
        if roots.len() > 1 {
            log::warn!("prefab `{name}` has {} roots, using the first", roots.len());
        }

        if let Some(scene) = self.scene_mut(&name) {
            scene.is_prefab = true;
            scene.prefab_root = Some(root);
        }
        self.set_scene_active(&name, false);
        log::info!("loaded prefab `{name}`");
        Ok(name)
    }

    /// Writes a prefab scene to `path`.
    pub fn save_prefab(&self, name: &str, path: impl AsRef<Path>) -> Result<(), EcsError> {
        if self.prefab_root(name).is_none() {
            return Err(EcsError::InvalidPrefab {
                name: name.to_owned(),
                reason: "not a loaded prefab".to_owned(),
            });
        }
        self.save_scene(name, path)
    }

    /// The template root of prefab `name`.
    pub fn prefab_root(&self, name: &str) -> Option<EntityId> {
        self.scene(name)
            .filter(|scene| scene.is_prefab())
            .and_then(|scene| scene.prefab_root())
    }

    /// Instantiates prefab `prefab` into scene `target`.
    ///
    /// Every entity of the new subtree is tagged with the prefab's name.
    pub fn create_prefab_instance(&mut self, prefab: &str, target: &str) -> Result<EntityId, EcsError> {
        let template = self.prefab_root(prefab).ok_or_else(|| EcsError::InvalidPrefab {
            name: prefab.to_owned(),
            reason: "not a loaded prefab".to_owned(),
        })?;
        let instance = self.create_entity(target)?;
        self.deep_sync(template, instance)?;
        self.tag_instance(instance, prefab);
        log::debug!("instanced prefab `{prefab}` as {instance} in `{target}`");
        Ok(instance)
    }

    /// Makes the subtree under `instance` equal to the subtree under
    /// `template`.
    ///
    /// Components are copied, replaced or removed so that both sides own the
    /// same values, then child lists are padded with blank entities or
    /// trimmed from the end until their lengths match, and the children are
    /// synced pairwise. Only the template-controlled fields of [`Name`] take
    /// part; GUIDs and prefab linkage stay with the instance.
    pub fn deep_sync(&mut self, template: EntityId, instance: EntityId) -> Result<(), EcsError> {
        for id in [template, instance] {
            if !self.is_valid_entity(id) {
                return Err(EcsError::InvalidEntity(id));
            }
        }
        if template == instance {
            return Ok(());
        }
        if self.descendants_of(template).contains(&instance) || self.descendants_of(instance).contains(&template) {
            log::warn!("cannot sync {instance} with {template}: the subtrees overlap");
            return Ok(());
        }

        self.sync_subtree(template, instance)?;
        self.update_world_matrices(instance);
        Ok(())
    }

    fn sync_subtree(&mut self, template: EntityId, instance: EntityId) -> Result<(), EcsError> {
        self.sync_components(template, instance);

        let template_children = self.children_of(template).to_vec();
        let existing = self.children_of(instance).len();
        if template_children.len() > existing {
            let scene = self
                .scene_of(instance)
                .map(str::to_owned)
                .ok_or(EcsError::InvalidEntity(instance))?;
            for _ in existing..template_children.len() {
                let child = self.create_entity(&scene)?;
                self.set_parent(instance, child, false);
            }
        } else {
            let extra = self.children_of(instance)[template_children.len()..].to_vec();
            for child in extra {
                self.delete_entity(child);
            }
        }

        let instance_children = self.children_of(instance).to_vec();
        for (template_child, instance_child) in template_children.into_iter().zip(instance_children) {
            self.sync_subtree(template_child, instance_child)?;
        }
        Ok(())
    }

    fn sync_components(&mut self, template: EntityId, instance: EntityId) {
        let Some(wanted) = self.entity_signature(template) else {
            return;
        };
        for bit in 0..self.components.len() {
            if bit == NAME_BIT {
                let Some(source) = self.get::<Name>(template).cloned() else {
                    continue;
                };
                if let Some(name) = self.get_mut::<Name>(instance) {
                    if !name.matches_template(&source) {
                        name.apply_template(&source);
                    }
                }
            } else if wanted.is_set(bit)
                && (!self.has_bit(instance, bit) || !self.compare_bit(bit, template, instance))
            {
                self.duplicate_bit(bit, template, instance);
            }
        }

        // Copying may have attached dependents the template does not own.
        for bit in 0..self.components.len() {
            if !wanted.is_set(bit) && self.has_bit(instance, bit) {
                self.detach(instance, bit);
            }
        }
    }

    /// The components that differ between `instance` and its counterpart in
    /// the prefab template.
    ///
    /// `instance` may be any entity of an instanced subtree; its counterpart
    /// is found by following the same child indices from the template root.
    /// If there is no counterpart every component of `instance` is reported.
    /// Entities that are not prefab instances yield an empty set.
    pub fn compare_prefab_with_instance(&self, instance: EntityId) -> Signature {
        let Some(prefab) = self
            .get::<Name>(instance)
            .filter(|name| name.is_prefab)
            .map(|name| name.prefab_name.clone())
        else {
            log::warn!("entity {instance} is not a prefab instance");
            return Signature::EMPTY;
        };
        let Some(template_root) = self.prefab_root(&prefab) else {
            log::warn!("prefab `{prefab}` of entity {instance} is not loaded");
            return Signature::EMPTY;
        };

        let mut path = Vec::new();
        let mut current = instance;
        while let Some(parent) = self.parent_of(current).filter(|parent| self.is_instance_of(*parent, &prefab)) {
            let index = self
                .children_of(parent)
                .iter()
                .position(|child| *child == current)
                .unwrap_or_default();
            path.push(index);
            current = parent;
        }

        let mut template = template_root;
        for index in path.into_iter().rev() {
            match self.children_of(template).get(index) {
                Some(child) => template = *child,
                None => return self.entity_signature(instance).unwrap_or_default(),
            }
        }
        self.diff_components(template, instance)
    }

    fn diff_components(&self, template: EntityId, instance: EntityId) -> Signature {
        let (Some(wanted), Some(owned)) = (self.entity_signature(template), self.entity_signature(instance)) else {
            return Signature::EMPTY;
        };
        let mut changed = Signature::EMPTY;
        for bit in 0..self.components.len() {
            let differs = if bit == NAME_BIT {
                match (self.get::<Name>(template), self.get::<Name>(instance)) {
                    (Some(source), Some(name)) => !name.matches_template(source),
                    _ => false,
                }
            } else {
                match (wanted.is_set(bit), owned.is_set(bit)) {
                    (true, true) => !self.compare_bit(bit, template, instance),
                    (a, b) => a != b,
                }
            };
            if differs {
                changed.set(bit);
            }
        }
        changed
    }

    /// Re-syncs every instance of prefab `name` with the template. Returns the
    /// number of instances visited.
    ///
    /// Instances are not tracked, so this scans every live entity for
    /// instance roots.
    pub fn propagate_prefab(&mut self, name: &str) -> Result<usize, EcsError> {
        let template = self.prefab_root(name).ok_or_else(|| EcsError::InvalidPrefab {
            name: name.to_owned(),
            reason: "not a loaded prefab".to_owned(),
        })?;
        let instances: Vec<EntityId> = self
            .entities()
            .filter(|id| self.scene_of(*id) != Some(name))
            .filter(|id| self.is_instance_of(*id, name))
            .filter(|id| {
                self.parent_of(*id)
                    .map_or(true, |parent| !self.is_instance_of(parent, name))
            })
            .collect();

        for instance in &instances {
            self.deep_sync(template, *instance)?;
            self.tag_instance(*instance, name);
        }
        log::info!("propagated prefab `{name}` to {} instance(s)", instances.len());
        Ok(instances.len())
    }

    /// Activates a prefab scene for editing.
    ///
    /// Only one prefab can be edited at a time.
    pub fn enter_prefab_edit(&mut self, name: &str) -> bool {
        if self.prefab_root(name).is_none() {
            log::warn!("`{name}` is not a loaded prefab");
            return false;
        }
        if let Some(current) = &self.prefab_edit {
            if current != name {
                log::warn!("already editing prefab `{current}`");
                return false;
            }
        }
        self.set_scene_active(name, true);
        self.prefab_edit = Some(name.to_owned());
        true
    }

    /// Leaves prefab edit mode, deactivating the prefab and pushing its edits
    /// to every instance. Returns the number of instances updated.
    pub fn exit_prefab_edit(&mut self) -> Result<usize, EcsError> {
        let Some(name) = self.prefab_edit.take() else {
            return Ok(0);
        };
        self.set_scene_active(&name, false);
        self.propagate_prefab(&name)
    }

    /// The prefab currently being edited.
    pub fn edited_prefab(&self) -> Option<&str> {
        self.prefab_edit.as_deref()
    }

    fn is_instance_of(&self, id: EntityId, prefab: &str) -> bool {
        self.get::<Name>(id)
            .is_some_and(|name| name.is_prefab && name.prefab_name == prefab)
    }

    fn tag_instance(&mut self, root: EntityId, prefab: &str) {
        let mut subtree = vec![root];
        subtree.extend(self.descendants_of(root));
        for id in subtree {
            if let Some(name) = self.get_mut::<Name>(id) {
                name.is_prefab = true;
                name.prefab_name = prefab.to_owned();
            }
        }
    }
}
