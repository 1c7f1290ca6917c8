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

use std::collections::BTreeMap;
use std::fs;

use ember_core::math::{Quaternion, Vec3};
use ember_core::reflect::Reflect;
use ember_core::Guid;
use ember_data::ecs::{Component, Name, Transform, World};
use ember_data::{EcsError, WorldConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Tag {
    tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
struct Stats {
    health: i32,
    speed: f32,
    armor: u8,
    alive: bool,
    label: String,
    waypoints: Vec<Vec3>,
    flags: Vec<u16>,
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn new_world() -> World {
    init_logs();
    let mut world = World::new(WorldConfig::default());
    world.register_component::<Tag>(&[]).unwrap();
    world.register_component::<Stats>(&[]).unwrap();
    world
}

/// Values that survive a trip through decimal text unchanged.
fn exact_f32(rng: &mut StdRng) -> f32 {
    rng.gen_range(-4000..4000) as f32 * 0.25
}

fn random_stats(rng: &mut StdRng) -> Stats {
    Stats {
        health: rng.gen(),
        speed: exact_f32(rng),
        armor: rng.gen(),
        alive: rng.gen(),
        label: (0..rng.gen_range(0..12))
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect(),
        waypoints: (0..rng.gen_range(0..5))
            .map(|_| Vec3::new(exact_f32(rng), exact_f32(rng), exact_f32(rng)))
            .collect(),
        flags: (0..rng.gen_range(0..4)).map(|_| rng.gen()).collect(),
    }
}

/// Every entity of a scene keyed by GUID, with its saved components.
fn snapshot(world: &World, scene: &str) -> BTreeMap<Guid, BTreeMap<&'static str, Value>> {
    world
        .scene(scene)
        .unwrap()
        .entities()
        .iter()
        .map(|id| {
            let components = world
                .component_names(*id)
                .into_iter()
                .map(|name| (name, world.save_component(*id, name).unwrap()))
                .collect();
            (world.guid_of(*id).unwrap(), components)
        })
        .collect()
}

#[test]
fn non_finite_floats_survive_save_clear_and_load() {
    // --- 1. ARRANGE ---
    let mut world = new_world();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S.json");
    assert!(world.create_scene("S"));
    let id = world.create_entity("S").unwrap();
    world.insert_component(
        id,
        Stats {
            speed: f32::INFINITY,
            waypoints: vec![Vec3::new(f32::NEG_INFINITY, f32::NAN, 0.5)],
            ..Stats::default()
        },
    );
    let guid = world.guid_of(id).unwrap();

    // --- 2. ACT ---
    world.save_scene("S", &path).unwrap();
    world.clear_scene("S");
    world.load_scene(&path, None).unwrap();

    // --- 3. ASSERT ---
    let loaded = world.find_by_guid(guid).unwrap();
    let stats = world.get::<Stats>(loaded).unwrap();
    assert_eq!(stats.speed, f32::INFINITY);
    assert_eq!(stats.waypoints[0].x, f32::NEG_INFINITY);
    assert!(stats.waypoints[0].y.is_nan());
    assert_eq!(stats.waypoints[0].z, 0.5);
    assert!(world.compare_component("Stats", loaded, loaded));
}

#[test]
fn tagged_entity_survives_save_clear_and_load() {
    // --- 1. ARRANGE ---
    let mut world = new_world();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S.json");
    assert!(world.create_scene("S"));
    let e1 = world.create_entity("S").unwrap();
    world.insert_component(e1, Tag { tag: "Enemy".to_owned() });
    world.insert_component(e1, Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)));
    let guid = world.guid_of(e1).unwrap();
    let signature = world.entity_signature(e1).unwrap();
    let before = snapshot(&world, "S");

    // --- 2. ACT ---
    world.save_scene("S", &path).unwrap();
    assert!(world.clear_scene("S"));
    assert_eq!(world.entity_count(), 0);
    let name = world.load_scene(&path, Some("S")).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(name, "S");
    assert_eq!(world.scene("S").unwrap().entities().len(), 1);
    let loaded = world.find_by_guid(guid).unwrap();
    assert_eq!(world.entity_signature(loaded), Some(signature));
    assert_eq!(world.get::<Tag>(loaded).unwrap().tag, "Enemy");
    assert_eq!(world.get::<Transform>(loaded).unwrap().translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(snapshot(&world, "S"), before);
    assert_eq!(world.scene("S").unwrap().path(), Some(path.as_path()));
}

#[test]
fn randomized_components_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut world = new_world();
    world.create_scene("random");
    let source = world.create_entity("random").unwrap();
    let target = world.create_entity("random").unwrap();

    for _ in 0..64 {
        let stats = random_stats(&mut rng);
        world.insert_component(source, stats.clone());

        let saved = world.save_component(source, Stats::NAME).unwrap();
        world.load_component(target, Stats::NAME, &saved).unwrap();

        assert!(world.compare_component(Stats::NAME, source, target), "{saved}");
        assert_eq!(world.get::<Stats>(target), Some(&stats));
    }
}

#[test]
fn hierarchy_and_order_survive_a_file_round_trip() {
    // --- 1. ARRANGE ---
    let mut rng = StdRng::seed_from_u64(7);
    let mut world = new_world();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.json");
    world.create_scene("level");
    let root = world.create_entity("level").unwrap();
    let mut children = Vec::new();
    for i in 0..3 {
        let child = world.create_entity("level").unwrap();
        world.get_mut::<Name>(child).unwrap().name = format!("child-{i}");
        world.insert_component(child, random_stats(&mut rng));
        world.insert_component(
            child,
            Transform::new(Vec3::new(i as f32, 0.0, 0.0), Quaternion::IDENTITY, Vec3::ONE),
        );
        assert!(world.set_parent(root, child, false));
        children.push(world.guid_of(child).unwrap());
    }
    let before = snapshot(&world, "level");

    // --- 2. ACT ---
    world.save_scene("level", &path).unwrap();
    world.clear_scene("level");
    world.load_scene(&path, None).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(snapshot(&world, "level"), before);
    let root = world
        .scene("level")
        .unwrap()
        .entities()
        .iter()
        .copied()
        .find(|id| world.parent_of(*id).is_none())
        .unwrap();
    let loaded: Vec<Guid> = world
        .children_of(root)
        .iter()
        .map(|id| world.guid_of(*id).unwrap())
        .collect();
    assert_eq!(loaded, children);
    let last = world.find_by_guid(children[2]).unwrap();
    assert_eq!(world.world_matrix(last).unwrap().translation(), Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn saved_documents_use_component_names_as_keys() {
    let mut world = new_world();
    world.create_scene("doc");
    let parent = world.create_entity("doc").unwrap();
    let child = world.create_entity("doc").unwrap();
    world.set_parent(parent, child, false);
    world.insert_component(child, Tag { tag: "Leaf".to_owned() });

    let document = serde_json::to_value(world.scene_to_document("doc").unwrap()).unwrap();

    let entities = document.as_array().unwrap();
    assert_eq!(entities.len(), 1, "children are nested, not listed");
    let root = entities[0].as_object().unwrap();
    let keys: Vec<&str> = root.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["entityGUID", "Name", "Transform", "children"]);
    assert_eq!(root["children"][0]["Tag"]["tag"], "Leaf");
}

#[test]
fn loading_reports_io_and_document_failures() {
    let mut world = new_world();
    let dir = tempfile::tempdir().unwrap();

    let missing = world.load_scene(dir.path().join("missing.json"), None);
    assert!(matches!(missing, Err(EcsError::Io { .. })));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(world.load_scene(&broken, None), Err(EcsError::Document { .. })));
    assert!(!world.has_scene("broken"));

    world.create_scene("taken");
    let taken = dir.path().join("taken.json");
    fs::write(&taken, "[]").unwrap();
    assert!(matches!(
        world.load_scene(&taken, None),
        Err(EcsError::SceneAlreadyLoaded(name)) if name == "taken"
    ));
}

#[test]
fn reparenting_across_scenes_moves_the_subtree() {
    // --- 1. ARRANGE ---
    let mut world = new_world();
    world.create_scene("a");
    world.create_scene("b");
    let parent = world.create_entity("a").unwrap();
    let child = world.create_entity("b").unwrap();
    let grandchild = world.create_entity("b").unwrap();
    world.set_parent(child, grandchild, false);

    // --- 2. ACT ---
    assert!(world.set_parent(parent, child, true));

    // --- 3. ASSERT ---
    for id in [parent, child, grandchild] {
        assert_eq!(world.scene_of(id), Some("a"));
    }
    assert_eq!(world.scene("a").unwrap().entities(), &[parent, child, grandchild]);
    assert!(world.scene("b").unwrap().entities().is_empty());
}
