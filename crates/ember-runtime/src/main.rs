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

//! Headless Ember runtime.
//!
//! Usage: `ember-runtime [config.ron]`

mod config;
mod systems;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ember_core::math::Vec3;
use ember_data::ecs::{GameState, Name, Transform, World};

use crate::config::RuntimeConfig;
use crate::systems::{Lifetime, LifetimeSystem, Spin, SpinSystem};

fn main() -> Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => RuntimeConfig::load(&path)?,
        None => RuntimeConfig::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter)).init();
    log::info!("starting ember runtime");

    let mut world = World::new(config.world.clone());
    register(&mut world)?;

    for path in &config.prefabs {
        world
            .load_prefab(path)
            .with_context(|| format!("Failed to load prefab {}", path.display()))?;
    }
    for path in &config.scenes {
        world
            .load_scene(path, None)
            .with_context(|| format!("Failed to load scene {}", path.display()))?;
    }
    if config.scenes.is_empty() {
        if let Some(scene) = &config.world.default_scene {
            populate(&mut world, scene)?;
        }
    }

    run(&mut world, &config);

    if let Some(dir) = &config.output_dir {
        save_scenes(&world, dir)?;
    }
    log::info!("ember runtime stopped after reaching {:?}", world.state());
    Ok(())
}

fn register(world: &mut World) -> Result<()> {
    world.register_component::<Spin>(&[])?;
    world.register_component::<Lifetime>(&[])?;
    world.register_system(LifetimeSystem, &["Lifetime"], &[GameState::Running])?;
    world.register_system(SpinSystem, &["Spin", "Transform"], &[GameState::Running])?;
    Ok(())
}

/// Fills an empty default scene with a few spinning entities and one
/// instance of every loaded prefab.
fn populate(world: &mut World, scene: &str) -> Result<()> {
    let pivot = world.create_entity(scene)?;
    if let Some(name) = world.get_mut::<Name>(pivot) {
        name.name = "Pivot".to_owned();
    }
    world.insert_component(pivot, Spin { radians_per_second: 1.0 });

    for i in 0..4 {
        let satellite = world.create_entity(scene)?;
        world.insert_component(satellite, Transform::from_translation(Vec3::new(2.0 + i as f32, 0.0, 0.0)));
        world.insert_component(satellite, Lifetime { seconds: 1.0 + i as f32 });
        world.set_parent(pivot, satellite, true);
    }

    let prefabs: Vec<String> = world
        .scene_names()
        .into_iter()
        .filter(|name| world.prefab_root(name).is_some())
        .map(str::to_owned)
        .collect();
    for prefab in prefabs {
        world.create_prefab_instance(&prefab, scene)?;
    }
    Ok(())
}

fn run(world: &mut World, config: &RuntimeConfig) {
    let step = Duration::from_secs_f64(1.0 / config.tick_rate_hz.max(1.0));
    let dt = step.as_secs_f32();
    let mut ticks = 0u64;

    loop {
        let started = Instant::now();
        if !world.tick(dt) {
            break;
        }
        ticks += 1;
        if config.max_ticks.is_some_and(|max| ticks >= max) {
            world.set_state(GameState::Terminate);
        }
        if let Some(rest) = step.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
    log::info!("ran {ticks} ticks, {} entities alive", world.entity_count());
}

fn save_scenes(world: &World, dir: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for scene in world.scene_names() {
        if world.prefab_root(scene).is_some() {
            continue;
        }
        let path = dir.join(format!("{scene}.json"));
        world
            .save_scene(scene, &path)
            .with_context(|| format!("Failed to save scene `{scene}`"))?;
    }
    Ok(())
}
