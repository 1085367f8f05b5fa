// SPDX-License-Identifier: MPL-2.0

//! Entities and the components attached to them.
//!
//! An [`Entity`] owns exactly one node in the [scene tree](crate::tree::SceneTree) and any number
//! of components. Every frame, each component is first given the chance to change its entity's
//! transform ([`Component::update`]) and then, once world matrices are known, to write its shader
//! uniforms ([`Component::prepare`]).

use std::{any::Any, fmt};

use crate::{
    frame::FrameContext,
    linear::{Mat4, Quat, Vec3},
    material::Material,
    mesh::MeshId,
    transform::Transform,
    tree::NodeIndex,
};

/// What a component is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Changes the entity's pose over time.
    Behaviour,
    /// Draws a mesh in world space.
    Render3d,
    /// Draws a mesh in clip space, over the world.
    Render2d,
}

/// The point light every lit material is shaded with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub light_position: Vec3,
    pub ambient_strength: f32,
    /// Scale of the highlight seen from the camera.
    pub specular_strength: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: Vec3::new(2.0, 5.0, 5.0),
            ambient_strength: 0.2,
            specular_strength: 0.5,
        }
    }
}

/// Per-entity draw state handed to [`Component::prepare`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawGlobals {
    /// Mesh space to world space for the owning entity.
    pub model: Mat4,
    pub view_projection: Mat4,
    /// The camera's position in world space.
    pub view_position: Vec3,
    pub lighting: Lighting,
}

/// Draw order. World items are drawn before overlay items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    World,
    Overlay,
}

/// One mesh to draw with one material.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    pub mesh: MeshId,
    pub material: &'a Material,
    pub layer: Layer,
}

pub trait Component: fmt::Debug {
    fn capability(&self) -> Capability;

    /// Advances the component by one frame.
    fn update(&mut self, _transform: &mut Transform, _frame: &FrameContext) {}

    /// Writes uniform values for the coming draw.
    fn prepare(&mut self, _globals: &DrawGlobals) {}

    fn draw_item(&self) -> Option<DrawItem<'_>> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A thing in a scene.
#[derive(Debug)]
pub struct Entity {
    name: String,
    node: NodeIndex,
    components: Vec<Box<dyn Component>>,
}

impl Entity {
    pub(crate) fn new(name: String, node: NodeIndex) -> Self {
        Self {
            name,
            node,
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node holding this entity's transform.
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    pub fn add_component(&mut self, component: impl Component + 'static) -> &mut Self {
        self.components.push(Box::new(component));
        self
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.components.iter().map(|c| c.as_ref())
    }

    pub(crate) fn components_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> + '_ {
        self.components.iter_mut()
    }

    pub fn components_with(
        &self,
        capability: Capability,
    ) -> impl Iterator<Item = &dyn Component> + '_ {
        self.components().filter(move |c| c.capability() == capability)
    }

    /// The first component of type `T`.
    pub fn component<T: Component + 'static>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn component_mut<T: Component + 'static>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }
}

/// Draws a mesh in world space, lit by the scene's [`Lighting`].
///
/// Every frame the material receives `model`, `view_projection`, `light_position`,
/// `ambient_strength`, `view_position` and `specular_strength`, which is what
/// [`ShaderDescriptor::object`](crate::ShaderDescriptor::object) expects.
#[derive(Clone, Debug)]
pub struct Render3d {
    pub mesh: MeshId,
    pub material: Material,
}

impl Render3d {
    pub fn new(mesh: MeshId, material: Material) -> Self {
        Self { mesh, material }
    }
}

impl Component for Render3d {
    fn capability(&self) -> Capability {
        Capability::Render3d
    }

    fn prepare(&mut self, globals: &DrawGlobals) {
        self.material.set_uniform("model", globals.model);
        self.material.set_uniform("view_projection", globals.view_projection);
        self.material.set_uniform("light_position", globals.lighting.light_position);
        self.material.set_uniform("ambient_strength", globals.lighting.ambient_strength);
        self.material.set_uniform("view_position", globals.view_position);
        self.material.set_uniform("specular_strength", globals.lighting.specular_strength);
    }

    fn draw_item(&self) -> Option<DrawItem<'_>> {
        Some(DrawItem {
            mesh: self.mesh,
            material: &self.material,
            layer: Layer::World,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Draws a mesh whose vertices are already in clip space, such as a crosshair.
///
/// Its uniforms are left to the caller.
#[derive(Clone, Debug)]
pub struct Render2d {
    pub mesh: MeshId,
    pub material: Material,
}

impl Render2d {
    pub fn new(mesh: MeshId, material: Material) -> Self {
        Self { mesh, material }
    }
}

impl Component for Render2d {
    fn capability(&self) -> Capability {
        Capability::Render2d
    }

    fn draw_item(&self) -> Option<DrawItem<'_>> {
        Some(DrawItem {
            mesh: self.mesh,
            material: &self.material,
            layer: Layer::Overlay,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Spins its entity about an axis at a constant rate.
///
/// The rotation is `spin * tilt`: the tilt is applied first, so a tilted body still spins about
/// the world axis.
#[derive(Clone, Debug)]
pub struct Spin {
    pub axis: Vec3,
    pub degrees_per_second: f32,
    pub tilt: Quat,
    degrees: f32,
}

impl Spin {
    pub fn new(axis: Vec3, degrees_per_second: f32) -> Self {
        Self {
            axis: axis.normalize(),
            degrees_per_second,
            tilt: Quat::IDENTITY,
            degrees: 0.0,
        }
    }

    pub fn with_tilt(mut self, tilt: Quat) -> Self {
        self.tilt = tilt;
        self
    }

    /// The accumulated angle.
    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

impl Component for Spin {
    fn capability(&self) -> Capability {
        Capability::Behaviour
    }

    fn update(&mut self, transform: &mut Transform, frame: &FrameContext) {
        self.degrees = (self.degrees + self.degrees_per_second * frame.dt) % 360.0;

        let spin = Quat::from_axis_angle(self.axis, self.degrees.to_radians());
        transform.set_rotation(spin * self.tilt);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{frame::Viewport, material::ShaderId, tree::SceneTree};

    fn entity() -> Entity {
        let node = SceneTree::new().insert(Transform::identity(), None).unwrap();

        Entity::new("thing".to_owned(), node)
    }

    #[test]
    fn components_are_found_by_capability_and_type() {
        let mut entity = entity();
        entity
            .add_component(Spin::new(Vec3::Y, 10.0))
            .add_component(Render3d::new(MeshId(0), Material::new(ShaderId(0), None)))
            .add_component(Render2d::new(MeshId(1), Material::new(ShaderId(1), None)));

        assert_eq!(entity.components().count(), 3);
        assert_eq!(entity.components_with(Capability::Render3d).count(), 1);
        assert_eq!(entity.components_with(Capability::Behaviour).count(), 1);
        assert_eq!(entity.component::<Render2d>().map(|r| r.mesh), Some(MeshId(1)));

        entity.component_mut::<Spin>().unwrap().degrees_per_second = 20.0;
        assert_eq!(entity.component::<Spin>().unwrap().degrees_per_second, 20.0);
    }

    #[test]
    fn spin_accumulates_about_its_axis() {
        let mut spin = Spin::new(Vec3::Y, 90.0);
        let mut transform = Transform::identity();
        let frame = FrameContext::new(0.5, Viewport::new(1, 1));

        spin.update(&mut transform, &frame);
        spin.update(&mut transform, &frame);

        assert_relative_eq!(spin.degrees(), 90.0);
        let front = transform.rotation() * Vec3::NEG_Z;
        assert_relative_eq!(front.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn tilt_is_applied_before_spin() {
        let tilt = Quat::from_axis_angle(Vec3::X, (-90.0f32).to_radians());
        let mut spin = Spin::new(Vec3::Y, 0.0).with_tilt(tilt);
        let mut transform = Transform::identity();
        spin.update(&mut transform, &FrameContext::new(1.0, Viewport::new(1, 1)));

        // The body's +Y (its pole) is tipped onto the world's -Z.
        let pole = transform.rotation() * Vec3::Y;
        assert_relative_eq!(pole.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn render3d_writes_matrices_and_lighting() {
        let mut render = Render3d::new(MeshId(0), Material::new(ShaderId(0), None));
        let globals = DrawGlobals {
            model: Mat4::from_translation(Vec3::X),
            view_projection: Mat4::from_scale(Vec3::splat(2.0)),
            view_position: Vec3::new(0.0, 1.0, 3.0),
            lighting: Lighting::default(),
        };
        render.prepare(&globals);

        let material = &render.draw_item().unwrap().material;
        assert_eq!(material.uniform("model"), Some(globals.model.into()));
        assert_eq!(material.uniform("view_projection"), Some(globals.view_projection.into()));
        assert_eq!(material.uniform("ambient_strength"), Some(0.2f32.into()));
        assert_eq!(material.uniform("light_position"), Some(Vec3::new(2.0, 5.0, 5.0).into()));
        assert_eq!(material.uniform("view_position"), Some(Vec3::new(0.0, 1.0, 3.0).into()));
        assert_eq!(material.uniform("specular_strength"), Some(0.5f32.into()));
        assert_eq!(render.draw_item().unwrap().layer, Layer::World);
    }
}
