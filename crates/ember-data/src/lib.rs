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

//! # Ember Data
//!
//! The entity-component-system runtime: entity allocation and recycling,
//! sparse-set component pools, signature-matched systems, reflection-driven
//! component actions, scenes with a transform hierarchy, and prefabs.
//!
//! Everything hangs off an explicit [`ecs::World`] value; there is no global
//! state.

// Lets `#[derive(Component)]` name `::ember_data` from inside this crate.
extern crate self as ember_data;

pub mod config;
pub mod ecs;
pub mod error;
pub mod scene;

pub use config::WorldConfig;
pub use error::EcsError;
