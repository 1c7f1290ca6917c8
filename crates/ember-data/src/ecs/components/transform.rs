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

use ember_core::math::{Mat4, Quaternion, Vec3};
use ember_core::reflect::Reflect;
use ember_core::EntityId;
use ember_macros::Component;

/// An entity's position, rotation and scale relative to its parent, together
/// with the hierarchy links and the cached world matrix.
///
/// Every entity owns one. Only the local translation, rotation and scale are
/// reflected: they are what documents persist and what prefabs sync. The
/// parent link and child list are edited through the world's hierarchy
/// operations, and the world matrix is recomputed by transform propagation.
#[derive(Debug, Clone, PartialEq, Reflect, Component)]
pub struct Transform {
    /// The translation (position) of the entity.
    pub translation: Vec3,
    /// The rotation of the entity, represented as a quaternion.
    pub rotation: Quaternion,
    /// The scale of the entity.
    pub scale: Vec3,
    #[reflect(skip)]
    pub(crate) world: Mat4,
    #[reflect(skip)]
    pub(crate) parent: Option<EntityId>,
    #[reflect(skip)]
    pub(crate) children: Vec<EntityId>,
}

impl Transform {
    /// Creates a new `Transform` with a given translation, rotation, and scale.
    pub fn new(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            ..Self::default()
        }
    }

    /// Creates a new `Transform` with a given translation, and identity rotation/scale.
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quaternion::IDENTITY, Vec3::ONE)
    }

    /// The local matrix, `T * R * S`.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Overwrites the local translation, rotation and scale from an affine matrix.
    pub fn set_local_matrix(&mut self, matrix: &Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
    }

    /// The world matrix as of the last propagation.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// The parent entity, if any.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// The child entities, in attachment order.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}

impl Default for Transform {
    /// Returns the identity `Transform`, with no parent.
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        }
    }
}
