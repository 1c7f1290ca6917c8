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

use ember_core::reflect::Reflect;

/// A marker trait for types that can be attached to an entity.
///
/// Components are plain reflected data with a default value; the default is
/// what `add_component` stores and what a reset restores. The associated
/// `NAME` is the key used for registration, system requirements, and scene
/// documents. Derive it with `#[derive(Component)]`.
pub trait Component: Reflect + Default + 'static {
    /// The registered name of this component type.
    const NAME: &'static str;
}

pub use ember_macros::Component;
