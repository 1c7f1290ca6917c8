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

//! Reading and writing scenes as JSON documents.
//!
//! A scene document is an array of root entities. Each entity is an object
//! with an optional `entityGUID` string, one object per owned component keyed
//! by the component's registered name, and an optional `children` array of
//! nested entities.

use std::fs;
use std::path::Path;

use ember_core::{EntityId, Guid};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ecs::{Name, World};
use crate::error::EcsError;

/// One entity of a scene document, with its children nested inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    /// The entity's GUID, hyphenated.
    #[serde(rename = "entityGUID", default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Saved components keyed by registered name, in bit order.
    #[serde(flatten)]
    pub components: Map<String, Value>,
    /// Children living in the same scene.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityDocument>,
}

impl World {
    /// Saves `id` and its same-scene descendants.
    pub fn entity_to_document(&self, id: EntityId) -> Option<EntityDocument> {
        let signature = self.entity_signature(id)?;
        let scene = self.scene_of(id)?;

        let guid = self.guid_of(id).filter(|guid| !guid.is_nil());
        let mut components = Map::new();
        for bit in signature.iter() {
            let Some(name) = self.components.name_of(bit) else {
                continue;
            };
            if let Some(value) = self.save_component(id, name) {
                components.insert(name.to_owned(), value);
            }
        }
        let children = self
            .children_of(id)
            .iter()
            .filter(|child| self.scene_of(**child) == Some(scene))
            .filter_map(|child| self.entity_to_document(*child))
            .collect();

        Some(EntityDocument {
            guid: guid.map(|guid| guid.to_string()),
            components,
            children,
        })
    }

    /// Saves every root of a scene.
    ///
    /// An entity counts as a root when it has no parent or its parent lives
    /// in another scene; hierarchy links across scenes are not persisted.
    pub fn scene_to_document(&self, name: &str) -> Result<Vec<EntityDocument>, EcsError> {
        let scene = self
            .scene(name)
            .ok_or_else(|| EcsError::UnknownScene(name.to_owned()))?;
        Ok(scene
            .entities()
            .iter()
            .filter(|id| {
                self.parent_of(**id)
                    .map_or(true, |parent| self.scene_of(parent) != Some(name))
            })
            .filter_map(|id| self.entity_to_document(*id))
            .collect())
    }

    /// Writes a scene to `path` as pretty-printed JSON.
    pub fn save_scene(&self, name: &str, path: impl AsRef<Path>) -> Result<(), EcsError> {
        let path = path.as_ref();
        let document = self.scene_to_document(name)?;
        let text = serde_json::to_string_pretty(&document).map_err(|source| EcsError::Document {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| EcsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("saved scene `{name}` to {}", path.display());
        Ok(())
    }

    /// Loads the scene stored at `path`.
    ///
    /// The scene is named `name` if given, after the file stem otherwise, and
    /// must not be loaded already. Returns the scene name.
    pub fn load_scene(&mut self, path: impl AsRef<Path>, name: Option<&str>) -> Result<String, EcsError> {
        let path = path.as_ref();
        let name = match name {
            Some(name) => name.to_owned(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if self.has_scene(&name) {
            return Err(EcsError::SceneAlreadyLoaded(name));
        }

        let text = fs::read_to_string(path).map_err(|source| EcsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Vec<EntityDocument> =
            serde_json::from_str(&text).map_err(|source| EcsError::Document {
                path: path.to_path_buf(),
                source,
            })?;

        self.load_scene_document(&name, &document)?;
        if let Some(scene) = self.scene_mut(&name) {
            scene.path = Some(path.to_path_buf());
        }
        log::info!("loaded scene `{name}` from {}", path.display());
        Ok(name)
    }

    /// Spawns the entities of `document` into scene `name`, creating the
    /// scene if needed. Returns the spawned roots.
    ///
    /// Component keys that are not registered are skipped with a warning. If
    /// a component fails to load, every entity spawned by this call is
    /// deleted, and a scene created by this call is removed, before the error
    /// is returned.
    pub fn load_scene_document(
        &mut self,
        name: &str,
        document: &[EntityDocument],
    ) -> Result<Vec<EntityId>, EcsError> {
        let created = self.create_scene(name);

        let mut roots = Vec::with_capacity(document.len());
        for entity in document {
            match self.spawn_document(name, entity, None) {
                Ok(id) => roots.push(id),
                Err(err) => {
                    for root in roots {
                        self.delete_entity(root);
                    }
                    if created {
                        self.clear_scene(name);
                    }
                    return Err(err);
                }
            }
        }

        self.propagate_transforms();
        Ok(roots)
    }

    fn spawn_document(
        &mut self,
        scene: &str,
        document: &EntityDocument,
        parent: Option<EntityId>,
    ) -> Result<EntityId, EcsError> {
        let id = self.create_entity(scene)?;
        match self.fill_document(scene, id, document, parent) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.delete_entity(id);
                Err(err)
            }
        }
    }

    fn fill_document(
        &mut self,
        scene: &str,
        id: EntityId,
        document: &EntityDocument,
        parent: Option<EntityId>,
    ) -> Result<(), EcsError> {
        if let Some(text) = &document.guid {
            match Guid::parse(text) {
                Some(guid) => match self.find_by_guid(guid) {
                    Some(owner) => {
                        log::warn!("GUID {text} is already used by {owner}, entity {id} keeps a fresh one")
                    }
                    None => {
                        if let Some(name) = self.get_mut::<Name>(id) {
                            name.guid = guid;
                        }
                    }
                },
                None => log::warn!("ignoring malformed entity GUID `{text}`"),
            }
        }

        for (key, value) in &document.components {
            match self.component_bit(key) {
                Some(bit) => {
                    self.attach(id, bit);
                    self.load_bit(bit, id, value)?;
                }
                None => log::warn!("skipping unregistered component `{key}` in scene `{scene}`"),
            }
        }

        if let Some(parent) = parent {
            self.set_parent(parent, id, false);
        }
        for child in &document.children {
            self.spawn_document(scene, child, Some(id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_keys_follow_the_file_format() {
        let text = r#"[{"entityGUID":"0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12","Name":{"name":"Root"},"children":[{"Name":{"name":"Leaf"}}]}]"#;
        let document: Vec<EntityDocument> = serde_json::from_str(text).unwrap();

        assert_eq!(document.len(), 1);
        assert_eq!(document[0].guid.as_deref(), Some("0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12"));
        assert_eq!(document[0].components.len(), 1);
        assert_eq!(document[0].children[0].components["Name"], json!({"name": "Leaf"}));
        assert!(document[0].children[0].guid.is_none());

        let saved = serde_json::to_value(&document[0].children[0]).unwrap();
        assert_eq!(saved, json!({"Name": {"name": "Leaf"}}));
    }

    #[test]
    fn loading_restores_guids_and_nesting() {
        let mut world = World::default();
        let document: Vec<EntityDocument> = serde_json::from_value(json!([
            {
                "entityGUID": "0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12",
                "Name": {"name": "Root"},
                "Unknown": {"value": 1},
                "children": [{"Name": {"name": "Leaf"}}]
            }
        ]))
        .unwrap();

        let roots = world.load_scene_document("level", &document).unwrap();

        assert_eq!(roots.len(), 1);
        assert_eq!(world.entity_count(), 2);
        let guid = Guid::parse("0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12").unwrap();
        assert_eq!(world.find_by_guid(guid), Some(roots[0]));
        let leaf = world.children_of(roots[0])[0];
        assert_eq!(world.get::<Name>(leaf).unwrap().name, "Leaf");
    }

    #[test]
    fn a_bad_component_value_discards_the_new_scene() {
        let mut world = World::default();
        let document: Vec<EntityDocument> =
            serde_json::from_value(json!([{"Name": {"layer": "not a number"}}])).unwrap();

        let result = world.load_scene_document("broken", &document);

        assert!(result.is_err());
        assert!(!world.has_scene("broken"));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn a_failed_load_into_an_existing_scene_keeps_what_was_there() {
        // --- 1. ARRANGE ---
        let mut world = World::default();
        world.create_scene("level");
        let resident = world.create_entity("level").unwrap();
        let document: Vec<EntityDocument> = serde_json::from_value(json!([
            {"Name": {"name": "Fine"}, "children": [{"Name": {"name": "Leaf"}}]},
            {"Name": {"name": "Bad"}, "children": [{"Name": {"layer": "not a number"}}]}
        ]))
        .unwrap();

        // --- 2. ACT ---
        let result = world.load_scene_document("level", &document);

        // --- 3. ASSERT ---
        assert!(result.is_err());
        assert!(world.has_scene("level"));
        assert_eq!(world.scene("level").unwrap().entities(), &[resident]);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn a_guid_already_in_use_is_not_restored_twice() {
        // --- 1. ARRANGE ---
        let mut world = World::default();
        let document: Vec<EntityDocument> = serde_json::from_value(json!([
            {"entityGUID": "0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12", "Name": {"name": "Root"}}
        ]))
        .unwrap();
        let guid = Guid::parse("0b4d3c5e-8f43-4c4e-9a55-2f6fbb0f3a12").unwrap();

        // --- 2. ACT ---
        let first = world.load_scene_document("a", &document).unwrap();
        let second = world.load_scene_document("b", &document).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(world.guid_of(first[0]), Some(guid));
        assert_ne!(world.guid_of(second[0]), Some(guid));
        assert_eq!(world.find_by_guid(guid), Some(first[0]));
        assert_eq!(world.get::<Name>(second[0]).unwrap().name, "Root");
    }
}
