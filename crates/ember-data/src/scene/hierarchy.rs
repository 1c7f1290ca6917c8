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

//! Parent/child links between entities and world-matrix propagation.

use std::collections::VecDeque;

use ember_core::math::Mat4;
use ember_core::EntityId;

use crate::ecs::{ComponentPool, Transform, World};

/// Walks the hierarchy breadth-first from each seed, so parents are always
/// computed before their children.
fn propagate(pool: &mut ComponentPool<Transform>, mut queue: VecDeque<(EntityId, Mat4)>) {
    while let Some((id, parent_world)) = queue.pop_front() {
        let Some(transform) = pool.get_mut(id) else {
            continue;
        };
        transform.world = parent_world * transform.local_matrix();
        let world = transform.world;
        queue.extend(transform.children.iter().map(|child| (*child, world)));
    }
}

impl World {
    /// Makes `child` a child of `parent`.
    ///
    /// Rejected with a warning, leaving both entities untouched, if either is
    /// dead, if `child` already has a parent, or if `parent` is `child` or
    /// one of its descendants. With `update_transform` the child's local
    /// transform is rewritten so that its world matrix does not change.
    ///
    /// When the parent lives in another scene, the child and every
    /// descendant are moved into the parent's scene.
    pub fn set_parent(&mut self, parent: EntityId, child: EntityId, update_transform: bool) -> bool {
        if parent == child {
            log::warn!("entity {child} cannot be its own parent");
            return false;
        }
        if !self.is_valid_entity(parent) || !self.is_valid_entity(child) {
            log::warn!("cannot parent {child} to {parent}: entity is not alive");
            return false;
        }
        if let Some(current) = self.parent_of(child) {
            log::warn!("entity {child} already has parent {current}");
            return false;
        }
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                log::warn!("parenting {child} to {parent} would create a cycle");
                return false;
            }
            ancestor = self.parent_of(id);
        }

        if update_transform {
            let parent_world = self.compute_world_matrix(parent);
            let child_world = self.compute_world_matrix(child);
            match (parent_world.and_then(|m| m.affine_inverse()), child_world) {
                (Some(inverse), Some(child_world)) => {
                    if let Some(transform) = self.get_mut::<Transform>(child) {
                        transform.set_local_matrix(&(inverse * child_world));
                    }
                }
                _ => log::warn!("parent {parent} has a singular world matrix, keeping the local transform of {child}"),
            }
        }

        if let Some(transform) = self.get_mut::<Transform>(parent) {
            transform.children.push(child);
        }
        if let Some(transform) = self.get_mut::<Transform>(child) {
            transform.parent = Some(parent);
        }

        if let Some(scene) = self.scene_of(parent).map(str::to_owned) {
            let mut subtree = vec![child];
            subtree.extend(self.descendants_of(child));
            for id in subtree {
                if let Some(old) = self.scene_of(id).map(str::to_owned) {
                    if old != scene {
                        self.swap_scenes(&old, &scene, id);
                    }
                }
            }
        }

        self.update_world_matrices(child);
        true
    }

    /// Detaches `child` from its parent, making it a root.
    ///
    /// The child's local transform becomes its former world transform.
    pub fn remove_parent(&mut self, child: EntityId) -> bool {
        if self.parent_of(child).is_none() {
            log::warn!("entity {child} has no parent to remove");
            return false;
        }
        let world = self.compute_world_matrix(child);
        self.unlink_parent(child);
        if let (Some(world), Some(transform)) = (world, self.get_mut::<Transform>(child)) {
            transform.set_local_matrix(&world);
        }
        self.update_world_matrices(child);
        true
    }

    /// Drops the link between `child` and its parent without touching
    /// transforms.
    pub(crate) fn unlink_parent(&mut self, child: EntityId) {
        let Some(parent) = self.parent_of(child) else {
            return;
        };
        if let Some(transform) = self.get_mut::<Transform>(parent) {
            transform.children.retain(|id| *id != child);
        }
        if let Some(transform) = self.get_mut::<Transform>(child) {
            transform.parent = None;
        }
    }

    /// The parent of `id`.
    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.get::<Transform>(id)?.parent
    }

    /// The direct children of `id`, in attachment order.
    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.get::<Transform>(id)
            .map(|transform| transform.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every descendant of `id`, depth first.
    pub fn descendants_of(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(next).iter().rev());
        }
        out
    }

    /// The topmost ancestor of `id`, or `id` itself if it has no parent.
    pub fn root_of(&self, id: EntityId) -> Option<EntityId> {
        if !self.is_valid_entity(id) {
            return None;
        }
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        Some(current)
    }

    /// The cached world matrix of `id`, as of the last propagation.
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.get::<Transform>(id).map(Transform::world_matrix)
    }

    /// Computes the world matrix of `id` from the local transforms of its
    /// ancestors, ignoring the cache.
    pub fn compute_world_matrix(&self, id: EntityId) -> Option<Mat4> {
        let mut matrix = self.get::<Transform>(id)?.local_matrix();
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            let transform = self.get::<Transform>(parent)?;
            matrix = transform.local_matrix() * matrix;
            current = parent;
        }
        Some(matrix)
    }

    /// Recomputes the world matrix of every entity, roots first.
    pub fn propagate_transforms(&mut self) {
        let Some(pool) = self.components.pool_mut::<Transform>() else {
            return;
        };
        let roots: VecDeque<(EntityId, Mat4)> = pool
            .iter()
            .filter(|(_, transform)| transform.parent.is_none())
            .map(|(id, _)| (id, Mat4::IDENTITY))
            .collect();
        propagate(pool, roots);
    }

    /// Recomputes the world matrices of `id` and its descendants from the
    /// cached matrix of its parent.
    pub(crate) fn update_world_matrices(&mut self, id: EntityId) {
        let parent_world = self
            .parent_of(id)
            .and_then(|parent| self.world_matrix(parent))
            .unwrap_or(Mat4::IDENTITY);
        if let Some(pool) = self.components.pool_mut::<Transform>() {
            propagate(pool, VecDeque::from([(id, parent_world)]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::math::{Quaternion, Vec3, FRAC_PI_2};

    fn world_with_scene() -> World {
        let mut world = World::default();
        world.create_scene("main");
        world
    }

    #[test]
    fn child_world_is_parent_world_times_local() {
        let mut world = world_with_scene();
        let parent = world.create_entity("main").unwrap();
        let child = world.create_entity("main").unwrap();
        world.insert_component(parent, Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        world.insert_component(child, Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)));

        assert!(world.set_parent(parent, child, false));
        world.propagate_transforms();

        let expected = Mat4::from_translation(Vec3::new(10.0, 2.0, 0.0));
        assert!(world.world_matrix(child).unwrap().approx_eq(&expected, 1e-5));
    }

    #[test]
    fn reparenting_with_update_keeps_the_world_matrix() {
        let mut world = world_with_scene();
        let parent = world.create_entity("main").unwrap();
        let child = world.create_entity("main").unwrap();
        world.insert_component(
            parent,
            Transform::new(
                Vec3::new(1.0, 2.0, 3.0),
                Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2),
                Vec3::ONE,
            ),
        );
        world.insert_component(child, Transform::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        world.propagate_transforms();
        let before = world.world_matrix(child).unwrap();

        assert!(world.set_parent(parent, child, true));

        assert!(world.world_matrix(child).unwrap().approx_eq(&before, 1e-4));
        assert!(world.remove_parent(child));
        assert!(world.world_matrix(child).unwrap().approx_eq(&before, 1e-4));
    }

    #[test]
    fn cycles_are_rejected_without_side_effects() {
        let mut world = world_with_scene();
        let a = world.create_entity("main").unwrap();
        let b = world.create_entity("main").unwrap();
        let c = world.create_entity("main").unwrap();
        assert!(world.set_parent(a, b, false));
        assert!(world.set_parent(b, c, false));

        assert!(!world.set_parent(c, a, false));
        assert!(!world.set_parent(a, a, false));

        assert_eq!(world.parent_of(a), None);
        assert_eq!(world.children_of(c), &[] as &[EntityId]);
        assert_eq!(world.descendants_of(a), vec![b, c]);
        assert_eq!(world.root_of(c), Some(a));
    }

    #[test]
    fn a_second_parent_is_rejected() {
        let mut world = world_with_scene();
        let first = world.create_entity("main").unwrap();
        let second = world.create_entity("main").unwrap();
        let child = world.create_entity("main").unwrap();
        assert!(world.set_parent(first, child, false));

        assert!(!world.set_parent(second, child, false));
        assert_eq!(world.parent_of(child), Some(first));
        assert!(world.children_of(second).is_empty());
    }
}
