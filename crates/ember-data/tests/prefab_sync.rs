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

use std::fs;

use ember_core::math::Vec3;
use ember_core::reflect::Reflect;
use ember_core::EntityId;
use ember_data::ecs::{Component, Name, Transform, World};
use ember_data::EcsError;
use tempfile::TempDir;

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Loot {
    amount: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Marker {
    note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Collider {
    radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Rigidbody {
    mass: f32,
}

const CRATE: &str = r#"[
  {
    "Name": { "name": "Crate", "tag": "Prop" },
    "Transform": { "translation": { "x": 0.0, "y": 1.0, "z": 0.0 } },
    "Loot": { "amount": 10 },
    "children": [
      { "Name": { "name": "Lid" }, "Transform": { "translation": { "x": 0.0, "y": 0.5, "z": 0.0 } } },
      { "Name": { "name": "Body" }, "Loot": { "amount": 2 } }
    ]
  }
]"#;

fn setup() -> (World, TempDir, EntityId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Crate.json"), CRATE).unwrap();

    let mut world = World::default();
    world.register_component::<Loot>(&[]).unwrap();
    world.register_component::<Marker>(&[]).unwrap();
    world.create_scene("level");
    let name = world.load_prefab(dir.path().join("Crate.json")).unwrap();
    assert_eq!(name, "Crate");
    let template = world.prefab_root("Crate").unwrap();
    (world, dir, template)
}

fn names_of_children(world: &World, id: EntityId) -> Vec<String> {
    world
        .children_of(id)
        .iter()
        .map(|child| world.get::<Name>(*child).unwrap().name.clone())
        .collect()
}

fn subtree(world: &World, root: EntityId) -> Vec<EntityId> {
    let mut ids = vec![root];
    ids.extend(world.descendants_of(root));
    ids
}

#[test]
fn prefabs_load_as_inactive_templates() {
    let (world, _dir, template) = setup();

    let scene = world.scene("Crate").unwrap();
    assert!(scene.is_prefab());
    assert!(!scene.is_active());
    assert_eq!(scene.prefab_root(), Some(template));
    assert_eq!(scene.entities().len(), 3);
    assert_eq!(names_of_children(&world, template), vec!["Lid", "Body"]);
}

#[test]
fn instances_start_equal_to_the_template() {
    // --- 1. ARRANGE ---
    let (mut world, _dir, template) = setup();

    // --- 2. ACT ---
    let instance = world.create_prefab_instance("Crate", "level").unwrap();

    // --- 3. ASSERT ---
    assert_eq!(world.scene_of(instance), Some("level"));
    assert_eq!(world.get::<Loot>(instance), Some(&Loot { amount: 10 }));
    assert_eq!(world.get::<Name>(instance).unwrap().tag, "Prop");
    assert_eq!(names_of_children(&world, instance), vec!["Lid", "Body"]);
    assert_ne!(world.guid_of(instance), world.guid_of(template));

    for id in subtree(&world, instance) {
        let name = world.get::<Name>(id).unwrap();
        assert!(name.is_prefab, "{} is tagged", name.name);
        assert_eq!(name.prefab_name, "Crate");
        assert_eq!(world.scene_of(id), Some("level"));
        assert!(world.compare_prefab_with_instance(id).is_empty());
    }
    let lid = world.children_of(instance)[0];
    assert_eq!(world.world_matrix(lid).unwrap().translation(), Vec3::new(0.0, 1.5, 0.0));
}

#[test]
fn deep_sync_twice_changes_nothing() {
    // --- 1. ARRANGE ---
    let (mut world, _dir, template) = setup();
    let instance = world.create_prefab_instance("Crate", "level").unwrap();
    let before = world.entity_to_document(instance).unwrap();
    let count = world.entity_count();

    // --- 2. ACT ---
    world.deep_sync(template, instance).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(world.entity_to_document(instance).unwrap(), before);
    assert_eq!(world.entity_count(), count);
    assert!(world.compare_prefab_with_instance(instance).is_empty());
}

#[test]
fn deep_sync_converges_when_dependents_were_removed_from_the_template() {
    // --- 1. ARRANGE ---
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = World::default();
    world.register_component::<Collider>(&[]).unwrap();
    world.register_component::<Rigidbody>(&["Collider"]).unwrap();
    world.create_scene("level");
    let template = world.create_entity("level").unwrap();
    world.insert_component(template, Rigidbody { mass: 4.0 });
    assert!(world.remove_component::<Collider>(template));
    let instance = world.create_entity("level").unwrap();

    // --- 2. ACT ---
    world.deep_sync(template, instance).unwrap();
    let first = world.component_names(instance);
    world.deep_sync(template, instance).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(first, world.component_names(template));
    assert_eq!(world.component_names(instance), first);
    assert!(!world.has_component::<Collider>(instance));
    assert_eq!(world.get::<Rigidbody>(instance), Some(&Rigidbody { mass: 4.0 }));
}

#[test]
fn compare_reports_only_the_edited_components() {
    // --- 1. ARRANGE ---
    let (mut world, _dir, _template) = setup();
    let instance = world.create_prefab_instance("Crate", "level").unwrap();
    let lid = world.children_of(instance)[0];
    let body = world.children_of(instance)[1];
    let loot = world.component_bit("Loot").unwrap();
    let transform = world.component_bit("Transform").unwrap();
    let marker = world.component_bit("Marker").unwrap();
    let name = world.component_bit("Name").unwrap();

    // --- 2. ACT ---
    world.get_mut::<Loot>(instance).unwrap().amount = 99;
    world.get_mut::<Transform>(lid).unwrap().translation = Vec3::X;
    world.add_component::<Marker>(body);
    world.get_mut::<Name>(body).unwrap().name = "Renamed".to_owned();

    // --- 3. ASSERT ---
    let root_diff = world.compare_prefab_with_instance(instance);
    assert_eq!(root_diff.iter().collect::<Vec<_>>(), vec![loot]);
    let lid_diff = world.compare_prefab_with_instance(lid);
    assert_eq!(lid_diff.iter().collect::<Vec<_>>(), vec![transform]);
    let body_diff = world.compare_prefab_with_instance(body);
    assert!(body_diff.is_set(marker) && body_diff.is_set(name));
    assert_eq!(body_diff.count(), 2);
}

#[test]
fn edits_propagate_to_every_instance() {
    // --- 1. ARRANGE ---
    let (mut world, _dir, template) = setup();
    world.create_scene("other");
    let instances = [
        world.create_prefab_instance("Crate", "level").unwrap(),
        world.create_prefab_instance("Crate", "level").unwrap(),
        world.create_prefab_instance("Crate", "other").unwrap(),
    ];
    world.get_mut::<Loot>(instances[0]).unwrap().amount = 1;

    // --- 2. ACT ---
    assert!(world.enter_prefab_edit("Crate"));
    assert!(world.scene("Crate").unwrap().is_active());
    world.get_mut::<Loot>(template).unwrap().amount = 25;
    let body = world.children_of(template)[1];
    assert!(world.remove_component::<Loot>(body));
    let handle = world.create_entity("Crate").unwrap();
    world.get_mut::<Name>(handle).unwrap().name = "Handle".to_owned();
    world.add_component::<Marker>(handle).unwrap().note = "grab".to_owned();
    world.set_parent(template, handle, false);
    let updated = world.exit_prefab_edit().unwrap();

    // --- 3. ASSERT ---
    assert_eq!(updated, 3);
    assert!(!world.scene("Crate").unwrap().is_active());
    assert_eq!(world.edited_prefab(), None);
    for instance in instances {
        assert_eq!(world.get::<Loot>(instance), Some(&Loot { amount: 25 }));
        assert_eq!(names_of_children(&world, instance), vec!["Lid", "Body", "Handle"]);
        let children = world.children_of(instance).to_vec();
        assert!(!world.has_component::<Loot>(children[1]));
        assert_eq!(world.get::<Marker>(children[2]).unwrap().note, "grab");
        assert!(world.get::<Name>(children[2]).unwrap().is_prefab);
        for id in subtree(&world, instance) {
            assert!(world.compare_prefab_with_instance(id).is_empty());
        }
    }
}

#[test]
fn removed_template_children_are_trimmed_from_instances() {
    let (mut world, _dir, template) = setup();
    let instance = world.create_prefab_instance("Crate", "level").unwrap();
    let body = world.children_of(instance)[1];
    let count = world.entity_count();

    let template_body = world.children_of(template)[1];
    world.delete_entity(template_body);
    assert_eq!(world.propagate_prefab("Crate").unwrap(), 1);

    assert_eq!(names_of_children(&world, instance), vec!["Lid"]);
    assert!(!world.is_valid_entity(body));
    assert_eq!(world.entity_count(), count - 2);
}

#[test]
fn instance_roots_follow_the_template_transform() {
    let (mut world, _dir, template) = setup();
    let instance = world.create_prefab_instance("Crate", "level").unwrap();
    world.get_mut::<Transform>(instance).unwrap().translation = Vec3::new(5.0, 5.0, 5.0);

    world.propagate_prefab("Crate").unwrap();

    assert_eq!(
        world.get::<Transform>(instance).unwrap().translation,
        world.get::<Transform>(template).unwrap().translation
    );
}

#[test]
fn prefabs_save_and_reload() {
    let (world, dir, _template) = setup();
    let copy = dir.path().join("CrateCopy.json");

    world.save_prefab("Crate", &copy).unwrap();
    assert!(matches!(
        world.save_prefab("level", dir.path().join("level.json")),
        Err(EcsError::InvalidPrefab { .. })
    ));

    let mut reloaded = World::default();
    reloaded.register_component::<Loot>(&[]).unwrap();
    reloaded.register_component::<Marker>(&[]).unwrap();
    let name = reloaded.load_prefab(&copy).unwrap();
    let root = reloaded.prefab_root(&name).unwrap();
    assert_eq!(name, "CrateCopy");
    assert_eq!(names_of_children(&reloaded, root), vec!["Lid", "Body"]);
    assert_eq!(reloaded.get::<Loot>(root), Some(&Loot { amount: 10 }));
}

#[test]
fn a_prefab_without_entities_is_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Empty.json");
    fs::write(&path, "[]").unwrap();
    let mut world = World::default();

    let result = world.load_prefab(&path);

    assert!(matches!(result, Err(EcsError::InvalidPrefab { name, .. }) if name == "Empty"));
    assert!(!world.has_scene("Empty"));
    assert!(world.create_prefab_instance("Empty", "anywhere").is_err());
}
