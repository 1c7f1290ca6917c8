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

//! # Ember Core
//!
//! Foundational crate containing the entity handle, the math primitives used by
//! transforms, and the reflection contract every component opts into.

#![warn(missing_docs)]

// Lets the derive macros name `::ember_core` from inside this crate.
extern crate self as ember_core;

pub mod ecs;
pub mod guid;
pub mod math;
pub mod reflect;

pub use ecs::entity::EntityId;
pub use guid::Guid;
pub use reflect::{Reflect, ReflectError};
