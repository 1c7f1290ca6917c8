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

//! Column-major 4x4 matrices for affine transforms.

use std::ops::Mul;

use super::{Quaternion, Vec3, Vec4, EPSILON};

/// A 4x4 column-major matrix.
///
/// Transforms compose as `parent * child`: the right-hand matrix is applied
/// first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// The columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Builds a matrix from its four columns.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns row `index` as a vector.
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        let pick = |c: Vec4| match index {
            0 => c.x,
            1 => c.y,
            2 => c.z,
            _ => c.w,
        };
        Vec4::new(
            pick(self.cols[0]),
            pick(self.cols[1]),
            pick(self.cols[2]),
            pick(self.cols[3]),
        )
    }

    /// A translation matrix.
    pub fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// A non-uniform scale matrix.
    pub fn from_scale(s: Vec3) -> Self {
        Self::from_cols(Vec4::X * s.x, Vec4::Y * s.y, Vec4::Z * s.z, Vec4::W)
    }

    /// A rotation matrix.
    pub fn from_quat(q: Quaternion) -> Self {
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, xy, xz) = (q.x * x2, q.x * y2, q.x * z2);
        let (yy, yz, zz) = (q.y * y2, q.y * z2, q.z * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);
        Self::from_cols(
            Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            Vec4::W,
        )
    }

    /// Composes `T * R * S`.
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quaternion, translation: Vec3) -> Self {
        let r = Self::from_quat(rotation);
        Self::from_cols(
            r.cols[0] * scale.x,
            r.cols[1] * scale.y,
            r.cols[2] * scale.z,
            Vec4::from_vec3(translation, 1.0),
        )
    }

    /// Splits an affine matrix back into scale, rotation and translation.
    ///
    /// A negative determinant is folded into the x scale. Shear cannot be
    /// represented and is lost.
    pub fn to_scale_rotation_translation(&self) -> (Vec3, Quaternion, Vec3) {
        let translation = self.cols[3].truncate();
        let (c0, c1, c2) = (
            self.cols[0].truncate(),
            self.cols[1].truncate(),
            self.cols[2].truncate(),
        );
        let det = c0.dot(c1.cross(c2));
        let mut scale = Vec3::new(c0.length(), c1.length(), c2.length());
        if det < 0.0 {
            scale.x = -scale.x;
        }

        let axis = |c: Vec3, s: f32| {
            if s.abs() > EPSILON {
                Vec4::from_vec3(c * (1.0 / s), 0.0)
            } else {
                Vec4::ZERO
            }
        };
        let rotation = Quaternion::from_rotation_matrix(&Self::from_cols(
            axis(c0, scale.x),
            axis(c1, scale.y),
            axis(c2, scale.z),
            Vec4::W,
        ));
        (scale, rotation, translation)
    }

    /// Inverse of an affine matrix, or `None` if its 3x3 block is singular.
    pub fn affine_inverse(&self) -> Option<Self> {
        let c0 = self.cols[0].truncate();
        let c1 = self.cols[1].truncate();
        let c2 = self.cols[2].truncate();
        let t = self.cols[3].truncate();

        let det = c0.dot(c1.cross(c2));
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        // Rows of the inverse 3x3 block are the cross products of the columns.
        let r0 = c1.cross(c2) * inv_det;
        let r1 = c2.cross(c0) * inv_det;
        let r2 = c0.cross(c1) * inv_det;

        Some(Self::from_cols(
            Vec4::new(r0.x, r1.x, r2.x, 0.0),
            Vec4::new(r0.y, r1.y, r2.y, 0.0),
            Vec4::new(r0.z, r1.z, r2.z, 0.0),
            Vec4::new(-r0.dot(t), -r1.dot(t), -r2.dot(t), 1.0),
        ))
    }

    /// Transforms a point (w = 1).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// The translation column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Element-wise approximate equality.
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.cols.iter().zip(other.cols.iter()).all(|(a, b)| {
            (a.x - b.x).abs() < epsilon
                && (a.y - b.y).abs() < epsilon
                && (a.z - b.z).abs() < epsilon
                && (a.w - b.w).abs() < epsilon
        })
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Mat4) -> Self {
        let rows = [self.row(0), self.row(1), self.row(2), self.row(3)];
        let col = |c: Vec4| Vec4::new(rows[0].dot(c), rows[1].dot(c), rows[2].dot(c), rows[3].dot(c));
        Self::from_cols(col(rhs.cols[0]), col(rhs.cols[1]), col(rhs.cols[2]), col(rhs.cols[3]))
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 2.0),
            Quaternion::from_axis_angle(Vec3::Z, crate::math::FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        let p = m.transform_point(Vec3::X);
        assert!(p.approx_eq(Vec3::new(10.0, 2.0, 0.0), 1e-4));
    }

    #[test]
    fn decompose_inverts_compose() {
        // --- 1. ARRANGE ---
        let scale = Vec3::new(1.5, 0.5, 3.0);
        let rotation = Quaternion::from_axis_angle(Vec3::new(0.3, 1.0, 0.2), 0.8);
        let translation = Vec3::new(-4.0, 2.5, 9.0);

        // --- 2. ACT ---
        let (s, r, t) =
            Mat4::from_scale_rotation_translation(scale, rotation, translation).to_scale_rotation_translation();

        // --- 3. ASSERT ---
        assert!(s.approx_eq(scale, 1e-4));
        assert!(r.approx_same_rotation(rotation, 1e-4));
        assert!(t.approx_eq(translation, 1e-4));
    }

    #[test]
    fn affine_inverse_undoes_the_transform() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            Quaternion::from_axis_angle(Vec3::Y, 0.7),
            Vec3::new(1.0, -2.0, 3.0),
        );
        let inv = m.affine_inverse().unwrap();
        assert!((m * inv).approx_eq(&Mat4::IDENTITY, 1e-4));
        assert!(Mat4::from_scale(Vec3::ZERO).affine_inverse().is_none());
    }
}
