// SPDX-License-Identifier: MPL-2.0

//! The pose of an entity.

use crate::linear::{translation, Basis, Mat4, Quat, Scalar, Vec3};

/// Position, rotation and scale, plus the local axes derived from the rotation.
///
/// The rotation is kept normalized; every setter renormalizes before storing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    /// Derived from `rotation` by [`Self::refresh_axes`].
    axes: Basis,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            axes: Basis::WORLD,
        }
    }

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut this = Self {
            position,
            rotation: Quat::IDENTITY,
            scale,
            axes: Basis::WORLD,
        };
        this.set_rotation(rotation);

        this
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn position_mut(&mut self) -> &mut Vec3 {
        &mut self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Stores `rotation`, normalized, and refreshes the local axes.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.refresh_axes();
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn scale_mut(&mut self) -> &mut Vec3 {
        &mut self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Recomputes the local front, right and up vectors from the current rotation.
    pub fn refresh_axes(&mut self) {
        self.axes = Basis::from_rotation(self.rotation);
    }

    pub fn axes(&self) -> Basis {
        self.axes
    }

    pub fn front(&self) -> Vec3 {
        self.axes.front
    }

    pub fn right(&self) -> Vec3 {
        self.axes.right
    }

    pub fn up(&self) -> Vec3 {
        self.axes.up
    }
}

// Movement.
impl Transform {
    /// Moves by `direction * speed * dt`.
    pub fn translate(&mut self, direction: Vec3, speed: Scalar, dt: Scalar) {
        self.position += direction * speed * dt;
    }

    pub fn move_forward(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(self.axes.front, speed, dt);
    }

    pub fn move_backward(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(-self.axes.front, speed, dt);
    }

    pub fn move_left(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(-self.axes.right, speed, dt);
    }

    pub fn move_right(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(self.axes.right, speed, dt);
    }

    pub fn move_up(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(self.axes.up, speed, dt);
    }

    pub fn move_down(&mut self, speed: Scalar, dt: Scalar) {
        self.translate(-self.axes.up, speed, dt);
    }
}

// Matrices.
impl Transform {
    /// Translation by the *negated* position.
    ///
    /// This is the translation half of a view matrix: the world is moved opposite to the
    /// observer.
    pub fn translation_matrix(&self) -> Mat4 {
        translation(-self.position)
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    pub fn scale_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    /// Mesh space to the space of this transform's parent.
    ///
    /// Scale is applied first, then rotation, then translation.
    pub fn model_matrix(&self) -> Mat4 {
        translation(self.position) * self.rotation_matrix() * self.scale_matrix()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::linear::{orientation, Vec4};

    #[test]
    fn identity_pose() {
        let transform = Transform::identity();

        assert_eq!(transform.position(), Vec3::ZERO);
        assert_eq!(transform.rotation(), Quat::IDENTITY);
        assert_eq!(transform.scale(), Vec3::ONE);
        assert_eq!(transform.axes(), Basis::WORLD);
        assert_eq!(transform.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn rotation_is_stored_normalized() {
        let mut transform = Transform::identity();
        transform.set_rotation(Quat::from_xyzw(0.0, 2.0, 0.0, 2.0));

        assert_relative_eq!(transform.rotation().length(), 1.0, epsilon = 1e-6);

        let transform = Transform::new(Vec3::ZERO, Quat::from_xyzw(1.0, 1.0, 1.0, 1.0), Vec3::ONE);
        assert_relative_eq!(transform.rotation().length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn forward_then_backward_returns_home() {
        let start = Vec3::new(1.0, -2.0, 3.5);
        let mut transform = Transform::new(start, orientation(25.0, -130.0), Vec3::ONE);

        transform.move_forward(2.5, 0.016);
        assert!(transform.position().distance(start) > 0.0);
        transform.move_backward(2.5, 0.016);

        assert_relative_eq!(transform.position().distance(start), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn movement_follows_local_axes() {
        let mut transform = Transform::identity();
        transform.set_rotation(orientation(0.0, 90.0));

        transform.move_forward(1.0, 1.0);
        assert_relative_eq!(transform.position().x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(transform.position().z, 0.0, epsilon = 1e-5);

        transform.move_left(1.0, 1.0);
        assert_relative_eq!(transform.position().z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn model_matrix_scales_rotates_then_translates() {
        let transform = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::splat(2.0),
        );

        let p = transform.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);

        assert_relative_eq!(p.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn nan_delta_time_propagates() {
        let mut transform = Transform::identity();
        transform.move_forward(1.0, f32::NAN);

        assert!(transform.position().z.is_nan());
    }
}
