// SPDX-License-Identifier: MPL-2.0

//! The observer of a [scene](crate::Scene).

use crate::{
    frame::FrameContext,
    input::{FrameInput, MovementInput},
    linear::{orientation, translation, AxisConvention, Mat4, Quat, Scalar, Vec3, VerticalAxis},
    transform::Transform,
};

/// Field of view and clip planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    /// The vertical field of view in degrees.
    fov: Scalar,
    min_fov: Scalar,
    max_fov: Scalar,
    near: Scalar,
    far: Scalar,
    /// Degrees of field of view removed per line scrolled.
    zoom_sensitivity: Scalar,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrustumConfig {
    pub fov: Scalar,
    pub min_fov: Scalar,
    pub max_fov: Scalar,
    pub near: Scalar,
    pub far: Scalar,
    pub zoom_sensitivity: Scalar,
}

impl Default for FrustumConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            min_fov: 1.0,
            max_fov: 65.0,
            near: 0.1,
            far: 100.0,
            zoom_sensitivity: 1.0,
        }
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(FrustumConfig::default())
    }
}

impl Frustum {
    /// Builds a frustum, swapping an inverted fov range into order.
    pub fn new(config: FrustumConfig) -> Self {
        let min_fov = config.min_fov.min(config.max_fov);
        let max_fov = config.min_fov.max(config.max_fov);

        Self {
            fov: config.fov.max(min_fov).min(max_fov),
            min_fov,
            max_fov,
            near: config.near,
            far: config.far,
            zoom_sensitivity: config.zoom_sensitivity,
        }
    }

    pub fn fov(&self) -> Scalar {
        self.fov
    }

    pub fn fov_range(&self) -> (Scalar, Scalar) {
        (self.min_fov, self.max_fov)
    }

    pub fn near(&self) -> Scalar {
        self.near
    }

    pub fn far(&self) -> Scalar {
        self.far
    }

    /// Narrows the field of view by `lines` scrolled, staying within the configured range.
    pub fn zoom(&mut self, lines: Scalar) {
        self.fov -= lines * self.zoom_sensitivity;
        self.fov = self.fov.max(self.min_fov).min(self.max_fov);
    }

    /// A right-handed perspective projection with a `[0, 1]` depth range.
    pub fn projection(&self, aspect: Scalar) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    /// World units per second.
    pub movement_speed: Scalar,
    /// Degrees per pixel of pointer motion per second of frame time.
    pub pointer_sensitivity: Scalar,
    pub axes: AxisConvention,
    /// Keep pitch within `±pitch_limit` so the view never flips over the poles.
    pub constrain_pitch: bool,
    /// Degrees. The sign is ignored.
    pub pitch_limit: Scalar,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            movement_speed: 2.5,
            pointer_sensitivity: 5.0,
            axes: AxisConvention::default(),
            constrain_pitch: true,
            pitch_limit: 89.9,
        }
    }
}

/// A free-look camera driven by pitch and yaw.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Degrees about the local X axis. Positive looks down.
    pitch: Scalar,
    /// Degrees about the world Y axis. Positive turns right.
    yaw: Scalar,
    transform: Transform,
    frustum: Frustum,
    config: CameraConfig,
    /// As of the last [`Self::update`].
    view_projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, CameraConfig::default(), Frustum::default())
    }
}

impl Camera {
    pub fn new(position: Vec3, config: CameraConfig, frustum: Frustum) -> Self {
        let mut this = Self {
            pitch: 0.0,
            yaw: 0.0,
            transform: Transform::from_position(position),
            frustum,
            config,
            view_projection: Mat4::IDENTITY,
        };
        this.refresh_rotation();

        this
    }

    pub fn pitch(&self) -> Scalar {
        self.pitch
    }

    pub fn yaw(&self) -> Scalar {
        self.yaw
    }

    /// Sets both angles, clamping pitch, and refreshes the orientation.
    pub fn set_angles(&mut self, pitch: Scalar, yaw: Scalar) {
        self.pitch = pitch;
        self.yaw = yaw;
        self.constrain_pitch();
        self.refresh_rotation();
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.set_position(position);
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn frustum_mut(&mut self) -> &mut Frustum {
        &mut self.frustum
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CameraConfig {
        &mut self.config
    }

    /// The orientation for the current pitch and yaw.
    pub fn rotation(&self) -> Quat {
        orientation(self.pitch, self.yaw)
    }

    /// Accumulates a pointer delta into pitch and yaw.
    ///
    /// The orientation itself is not refreshed until [`Self::refresh_rotation`].
    pub fn point(&mut self, dx: Scalar, dy: Scalar, dt: Scalar) {
        let delta = self.config.axes.apply((dx, dy).into());
        let scale = self.config.pointer_sensitivity * dt;

        self.yaw += delta.x * scale;
        self.pitch += delta.y * scale;
        self.constrain_pitch();
    }

    fn constrain_pitch(&mut self) {
        if self.config.constrain_pitch {
            // `max`/`min` rather than `clamp`, which panics on a NaN limit.
            let limit = self.config.pitch_limit.abs();
            self.pitch = self.pitch.max(-limit).min(limit);
        }
    }

    /// Recomputes the orientation quaternion and local axes from pitch and yaw.
    pub fn refresh_rotation(&mut self) {
        self.transform.set_rotation(self.rotation());
    }

    /// Moves along the current local axes for every held direction.
    pub fn apply_movement(&mut self, movement: &MovementInput, dt: Scalar) {
        let speed = self.config.movement_speed;
        let t = &mut self.transform;

        if movement.forward {
            t.move_forward(speed, dt);
        }
        if movement.backward {
            t.move_backward(speed, dt);
        }
        if movement.left {
            t.move_left(speed, dt);
        }
        if movement.right {
            t.move_right(speed, dt);
        }
        match self.config.axes.vertical {
            VerticalAxis::Local => {
                if movement.up {
                    t.move_up(speed, dt);
                }
                if movement.down {
                    t.move_down(speed, dt);
                }
            }
            VerticalAxis::World => {
                if movement.up {
                    t.translate(Vec3::Y, speed, dt);
                }
                if movement.down {
                    t.translate(Vec3::NEG_Y, speed, dt);
                }
            }
        }
    }

    /// Advances the camera by one frame.
    ///
    /// Movement uses the axes from the previous frame; the new orientation is only computed after
    /// the pointer delta is applied, so a frame that both moves and turns moves along the old
    /// facing.
    pub fn update(&mut self, input: &FrameInput, frame: &FrameContext) {
        self.apply_movement(&input.movement, frame.dt);
        self.point(input.pointer.x, input.pointer.y, frame.dt);
        if input.scroll != 0.0 {
            self.frustum.zoom(input.scroll);
        }
        self.refresh_rotation();
        self.view_projection = self.compute_view_projection(frame.viewport.aspect());
    }

    /// World space to camera space: rotation after translation by the negated position.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.rotation_matrix() * self.transform.translation_matrix()
    }

    /// Translation by the position, then rotation.
    pub fn world_matrix(&self) -> Mat4 {
        translation(self.transform.position()) * self.transform.rotation_matrix()
    }

    pub fn projection_matrix(&self, aspect: Scalar) -> Mat4 {
        self.frustum.projection(aspect)
    }

    /// Projection, rotation and translation, as computed by the last [`Self::update`].
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    pub fn compute_view_projection(&self, aspect: Scalar) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        frame::Viewport,
        linear::{Vec2, Vec4},
    };

    fn frame(dt: f32) -> FrameContext {
        FrameContext::new(dt, Viewport::new(1280, 720))
    }

    fn assert_mat4_identity(m: Mat4) {
        for (a, b) in m.to_cols_array().iter().zip(Mat4::IDENTITY.to_cols_array().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();

        for &dy in &[1.0e3, 5.0e4, -2.0e3, -1.0e6] {
            camera.point(0.0, dy, 1.0);
            assert!(camera.pitch() <= 89.9 && camera.pitch() >= -89.9);
        }

        camera.point(0.0, 1.0e6, 1.0);
        assert_eq!(camera.pitch(), 89.9);
        camera.point(0.0, -1.0e6, 1.0);
        assert_eq!(camera.pitch(), -89.9);

        camera.set_angles(120.0, 0.0);
        assert_eq!(camera.pitch(), 89.9);
    }

    #[test]
    fn pitch_is_clamped_through_update() {
        let mut camera = Camera::default();
        let down = FrameInput {
            pointer: Vec2::new(0.0, 1.0e6),
            ..Default::default()
        };
        let up = FrameInput {
            pointer: Vec2::new(0.0, -1.0e6),
            ..Default::default()
        };

        camera.update(&down, &frame(1.0));
        assert_eq!(camera.pitch(), 89.9);
        let front = camera.transform().front();
        assert!(front.y < 0.0 && front.z < 0.0);

        camera.update(&up, &frame(1.0));
        assert_eq!(camera.pitch(), -89.9);
        assert!(camera.transform().front().y > 0.0);
    }

    #[test]
    fn negative_pitch_limit_is_treated_as_its_magnitude() {
        let config = CameraConfig {
            pitch_limit: -10.0,
            ..Default::default()
        };
        let mut camera = Camera::new(Vec3::ZERO, config, Frustum::default());

        camera.point(0.0, 1.0e4, 1.0);
        assert_eq!(camera.pitch(), 10.0);
        camera.point(0.0, -1.0e4, 1.0);
        assert_eq!(camera.pitch(), -10.0);
    }

    #[test]
    fn nan_pitch_limit_does_not_panic() {
        let mut camera = Camera::default();
        camera.config_mut().pitch_limit = f32::NAN;

        camera.point(0.0, 20.0, 1.0);
        assert_relative_eq!(camera.pitch(), 100.0);
    }

    #[test]
    fn inverted_fov_range_is_put_in_order() {
        let mut frustum = Frustum::new(FrustumConfig {
            fov: 90.0,
            min_fov: 60.0,
            max_fov: 10.0,
            ..Default::default()
        });

        assert_eq!(frustum.fov_range(), (10.0, 60.0));
        assert_eq!(frustum.fov(), 60.0);
        frustum.zoom(1000.0);
        assert_eq!(frustum.fov(), 10.0);
        frustum.zoom(-1000.0);
        assert_eq!(frustum.fov(), 60.0);
    }

    #[test]
    fn pitch_can_be_left_unconstrained() {
        let config = CameraConfig {
            constrain_pitch: false,
            ..Default::default()
        };
        let mut camera = Camera::new(Vec3::ZERO, config, Frustum::default());
        camera.point(0.0, 100.0, 1.0);

        assert_relative_eq!(camera.pitch(), 500.0);
    }

    #[test]
    fn zoom_stays_within_range() {
        let mut frustum = Frustum::default();

        for &lines in &[1.0, 100.0, -3.0, -1000.0, 0.5, 44.0, -64.0] {
            frustum.zoom(lines);
            let (min, max) = frustum.fov_range();
            assert!(frustum.fov() >= min && frustum.fov() <= max);
        }

        frustum.zoom(1000.0);
        assert_eq!(frustum.fov(), 1.0);
        frustum.zoom(-1000.0);
        assert_eq!(frustum.fov(), 65.0);
    }

    #[test]
    fn rotation_stays_normalized() {
        let mut camera = Camera::default();
        let mut input = FrameInput::default();

        for i in 0..500 {
            let i = i as f32;
            input.pointer = Vec2::new((i * 1.7).sin() * 40.0, (i * 0.3).cos() * 25.0);
            camera.update(&input, &frame(0.016));

            assert_relative_eq!(camera.transform().rotation().length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn view_matrix_is_invertible() {
        let mut camera = Camera::new(
            Vec3::new(3.0, -1.0, 7.5),
            CameraConfig::default(),
            Frustum::default(),
        );

        for &(pitch, yaw) in &[(0.0, 0.0), (45.0, 30.0), (-89.9, 270.0), (10.0, -1000.0)] {
            camera.set_angles(pitch, yaw);
            let view = camera.view_matrix();

            assert_mat4_identity(view * view.inverse());
        }
    }

    #[test]
    fn view_matrix_moves_camera_to_origin() {
        let mut camera = Camera::new(
            Vec3::new(1.0, 2.0, 3.0),
            CameraConfig::default(),
            Frustum::default(),
        );
        camera.set_angles(20.0, 75.0);

        let eye = camera.view_matrix() * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert_relative_eq!(eye.truncate().length(), 0.0, epsilon = 1e-5);

        // A point straight ahead ends up on the -Z axis of camera space.
        let ahead = camera.position() + camera.transform().front() * 4.0;
        let ahead = camera.view_matrix() * ahead.extend(1.0);
        assert_relative_eq!(ahead.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ahead.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ahead.z, -4.0, epsilon = 1e-4);
    }

    #[test]
    fn default_axes_are_canonical() {
        let camera = Camera::default();

        assert_eq!(camera.pitch(), 0.0);
        assert_eq!(camera.yaw(), 0.0);
        assert_relative_eq!(camera.transform().front().z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.transform().right().x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.transform().up().y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn movement_uses_previous_frame_axes() {
        let mut camera = Camera::default();
        let mut input = FrameInput::default();
        input.movement.forward = true;
        // 90 degrees of yaw in a single one-second frame.
        input.pointer = Vec2::new(18.0, 0.0);

        camera.update(&input, &frame(1.0));

        assert_relative_eq!(camera.yaw(), 90.0);
        assert_relative_eq!(camera.position().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position().z, -2.5, epsilon = 1e-5);

        // The next frame moves along the new facing.
        input.pointer = Vec2::ZERO;
        camera.update(&input, &frame(1.0));
        assert_relative_eq!(camera.position().x, 2.5, epsilon = 1e-5);
        assert_relative_eq!(camera.position().z, -2.5, epsilon = 1e-5);
    }

    #[test]
    fn inverted_pointer_axes() {
        let config = CameraConfig {
            axes: AxisConvention {
                invert_x: true,
                invert_y: true,
                vertical: VerticalAxis::Local,
            },
            ..Default::default()
        };
        let mut camera = Camera::new(Vec3::ZERO, config, Frustum::default());
        camera.point(2.0, 2.0, 1.0);

        assert_relative_eq!(camera.yaw(), -10.0);
        assert_relative_eq!(camera.pitch(), -10.0);
    }

    #[test]
    fn vertical_movement_convention() {
        let mut input = FrameInput::default();
        input.movement.up = true;

        let mut local = Camera::default();
        local.set_angles(45.0, 0.0);
        local.update(&input, &frame(1.0));
        assert!(local.position().z < 0.0);

        let config = CameraConfig {
            axes: AxisConvention {
                vertical: VerticalAxis::World,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut world = Camera::new(Vec3::ZERO, config, Frustum::default());
        world.set_angles(45.0, 0.0);
        world.update(&input, &frame(1.0));
        assert_relative_eq!(world.position().y, 2.5);
        assert_relative_eq!(world.position().z, 0.0);
    }

    #[test]
    fn scroll_zooms_during_update() {
        let mut camera = Camera::default();
        let input = FrameInput {
            scroll: 5.0,
            ..Default::default()
        };
        camera.update(&input, &frame(0.016));

        assert_relative_eq!(camera.frustum().fov(), 40.0);
    }

    #[test]
    fn update_caches_view_projection() {
        let mut camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            CameraConfig::default(),
            Frustum::default(),
        );
        camera.update(&FrameInput::default(), &frame(0.016));

        let expected = camera.compute_view_projection(1280.0 / 720.0);
        assert_eq!(camera.view_projection(), expected);
    }

    #[test]
    fn world_matrix_translates_after_rotating() {
        let mut camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            CameraConfig::default(),
            Frustum::default(),
        );
        camera.set_angles(0.0, 90.0);

        let origin = camera.world_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.z, 5.0, epsilon = 1e-5);
    }
}
