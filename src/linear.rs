// SPDX-License-Identifier: MPL-2.0

//! Linear algebra definitions.
//!
//! The vector, matrix and quaternion types are [`glam`]'s; this module adds the handful of
//! conventions the engine builds on top of them.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub type Scalar = f32;

/// How pointer and vertical movement input map onto camera axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisConvention {
    /// Negate horizontal pointer deltas before they are applied to yaw.
    pub invert_x: bool,
    /// Negate vertical pointer deltas before they are applied to pitch.
    pub invert_y: bool,
    pub vertical: VerticalAxis,
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self {
            invert_x: false,
            invert_y: false,
            vertical: VerticalAxis::Local,
        }
    }
}

impl AxisConvention {
    /// Applies the inversion flags to a pointer delta.
    pub fn apply(&self, delta: Vec2) -> Vec2 {
        let x = if self.invert_x { -delta.x } else { delta.x };
        let y = if self.invert_y { -delta.y } else { delta.y };

        Vec2::new(x, y)
    }
}

/// The direction that up/down movement follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAxis {
    /// The transform's local up vector.
    Local,
    /// World +Y, regardless of where the transform is facing.
    World,
}

/// The orientation for a pitch and yaw, both in degrees.
///
/// Pitch is applied about the local X axis and yaw about the world Y axis. Composing them the other
/// way around introduces roll as soon as both angles are non-zero.
pub fn orientation(pitch: Scalar, yaw: Scalar) -> Quat {
    let pitch = Quat::from_axis_angle(Vec3::X, pitch.to_radians());
    let yaw = Quat::from_axis_angle(Vec3::Y, yaw.to_radians());

    (pitch * yaw).normalize()
}

/// A translation matrix.
pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Front, right and up unit vectors in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Basis {
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Basis {
    /// The canonical world axes: front is -Z, right is +X and up is +Y.
    pub const WORLD: Self = Self {
        front: Vec3::NEG_Z,
        right: Vec3::X,
        up: Vec3::Y,
    };

    /// Extracts the basis from a rotation.
    ///
    /// Front, right and up are the negated third, first and second columns of the transposed
    /// rotation matrix, i.e. the rows of the rotation matrix itself.
    pub fn from_rotation(rotation: Quat) -> Self {
        let transposed = Mat3::from_quat(rotation).transpose();

        Self {
            front: -transposed.z_axis,
            right: transposed.x_axis,
            up: transposed.y_axis,
        }
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::WORLD
    }
}
