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

//! Demo components and systems driven by the runtime.

use ember_core::math::{Quaternion, Vec3};
use ember_core::reflect::Reflect;
use ember_core::EntityId;
use ember_data::ecs::{Component, System, SystemContext, Transform};

/// Rotates an entity around its local Y axis.
#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
pub struct Spin {
    pub radians_per_second: f32,
}

/// Despawns an entity once `seconds` reaches zero.
#[derive(Debug, Clone, Default, PartialEq, Reflect, Component)]
pub struct Lifetime {
    pub seconds: f32,
}

pub struct SpinSystem;

impl System for SpinSystem {
    fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &[EntityId]) {
        let dt = ctx.delta_time();
        for &id in entities {
            let Some(speed) = ctx.get::<Spin>(id).map(|spin| spin.radians_per_second) else {
                continue;
            };
            if let Some(transform) = ctx.get_mut::<Transform>(id) {
                let step = Quaternion::from_axis_angle(Vec3::Y, speed * dt);
                transform.rotation = (step * transform.rotation).normalize();
            }
        }
    }
}

pub struct LifetimeSystem;

impl System for LifetimeSystem {
    fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &[EntityId]) {
        let dt = ctx.delta_time();
        for &id in entities {
            let expired = match ctx.get_mut::<Lifetime>(id) {
                Some(lifetime) => {
                    lifetime.seconds -= dt;
                    lifetime.seconds <= 0.0
                }
                None => false,
            };
            if expired {
                log::debug!("lifetime of {id} ran out");
                ctx.commands().despawn(id);
            }
        }
    }
}
