// SPDX-License-Identifier: MPL-2.0

use crate::{
    camera::Camera,
    component::{DrawGlobals, DrawItem, Entity, Lighting},
    frame::FrameContext,
    input::FrameInput,
    transform::Transform,
    tree::{NodeIndex, SceneTree},
    Result,
};

/// A camera looking at a hierarchy of entities.
#[derive(Debug, Default)]
pub struct Scene {
    pub camera: Camera,
    pub lighting: Lighting,
    tree: SceneTree,
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Default::default()
        }
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Creates an entity with an identity transform, optionally beneath `parent`.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        let node = self.tree.insert(Transform::identity(), parent)?;
        let entity = Entity::new(name.into(), node);
        tracing::debug!("Spawned entity '{}'", entity.name());
        self.entities.push(entity);

        Ok(node)
    }

    /// Destroys an entity and its transform. Its children become roots.
    pub fn despawn(&mut self, node: NodeIndex) -> Option<Entity> {
        let position = self.entities.iter().position(|e| e.node() == node)?;
        self.tree.remove(node);
        let entity = self.entities.remove(position);
        tracing::debug!("Despawned entity '{}'", entity.name());

        Some(entity)
    }

    /// Moves an entity beneath another, or to the root when `parent` is `None`.
    pub fn set_parent(&mut self, child: NodeIndex, parent: Option<NodeIndex>) -> Result<()> {
        self.tree.set_parent(child, parent)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    pub fn entity(&self, node: NodeIndex) -> Option<&Entity> {
        self.entities.iter().find(|e| e.node() == node)
    }

    pub fn entity_mut(&mut self, node: NodeIndex) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.node() == node)
    }

    /// The first entity with the given name.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn transform(&self, node: NodeIndex) -> Option<&Transform> {
        self.tree.get(node)
    }

    pub fn transform_mut(&mut self, node: NodeIndex) -> Option<&mut Transform> {
        self.tree.get_mut(node)
    }

    /// Advances the scene by one frame.
    ///
    /// The camera moves first. Then every component updates its entity's transform, and only once
    /// all transforms are final are world matrices computed and handed to
    /// [`Component::prepare`](crate::Component::prepare).
    pub fn update(&mut self, input: &FrameInput, frame: &FrameContext) {
        self.camera.update(input, frame);

        for entity in &mut self.entities {
            let Some(transform) = self.tree.get_mut(entity.node()) else {
                continue;
            };
            for component in entity.components_mut() {
                component.update(transform, frame);
            }
        }

        let view_projection = self.camera.view_projection();
        let view_position = self.camera.position();
        for entity in &mut self.entities {
            let Ok(model) = self.tree.world_matrix(entity.node()) else {
                continue;
            };
            let globals = DrawGlobals {
                model,
                view_projection,
                view_position,
                lighting: self.lighting,
            };
            for component in entity.components_mut() {
                component.prepare(&globals);
            }
        }
    }

    /// Everything to draw this frame: world items in entity order, then overlay items.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items: Vec<_> = self
            .entities
            .iter()
            .flat_map(|entity| entity.components())
            .filter_map(|component| component.draw_item())
            .collect();
        // Stable, so entity order is kept within a layer.
        items.sort_by_key(|item| item.layer);

        items
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        component::{Layer, Render2d, Render3d, Spin},
        error::Error,
        frame::Viewport,
        input::Movement,
        linear::{Mat4, Vec3},
        material::{Material, ShaderId},
        mesh::MeshId,
        uniform::UniformValue,
    };

    fn frame(dt: f32) -> FrameContext {
        FrameContext::new(dt, Viewport::new(800, 600))
    }

    fn render3d(mesh: usize) -> Render3d {
        Render3d::new(MeshId(mesh), Material::new(ShaderId(0), None))
    }

    fn model_of(scene: &Scene, node: NodeIndex) -> Mat4 {
        let render = scene.entity(node).unwrap().component::<Render3d>().unwrap();
        match render.material.uniform("model") {
            Some(UniformValue::Mat4(model)) => model,
            other => panic!("unexpected model uniform {:?}", other),
        }
    }

    #[test]
    fn spawn_and_despawn() {
        let mut scene = Scene::default();
        let parent = scene.spawn("parent", None).unwrap();
        let child = scene.spawn("child", Some(parent)).unwrap();

        assert_eq!(scene.entities().count(), 2);
        assert_eq!(scene.tree().parent(child), Some(parent));
        assert_eq!(scene.find("child").map(Entity::node), Some(child));

        let despawned = scene.despawn(parent).unwrap();
        assert_eq!(despawned.name(), "parent");
        assert!(scene.entity(parent).is_none());
        assert!(scene.transform(parent).is_none());
        assert_eq!(scene.tree().parent(child), None);
        assert!(scene.despawn(parent).is_none());
    }

    #[test]
    fn spawning_under_a_stale_parent_fails() {
        let mut scene = Scene::default();
        let gone = scene.spawn("gone", None).unwrap();
        scene.despawn(gone);

        assert!(matches!(scene.spawn("orphan", Some(gone)), Err(Error::StaleNode)));
        assert_eq!(scene.entities().count(), 0);
    }

    #[test]
    fn update_writes_uniforms_from_final_transforms() {
        let mut scene = Scene::default();
        scene.camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        let cube = scene.spawn("cube", None).unwrap();
        scene.transform_mut(cube).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        scene
            .entity_mut(cube)
            .unwrap()
            .add_component(Spin::new(Vec3::Y, 90.0))
            .add_component(render3d(0));

        scene.update(&FrameInput::default(), &frame(1.0));

        let transform = scene.transform(cube).unwrap();
        let model = model_of(&scene, cube).to_cols_array();
        for (a, b) in model.iter().zip(transform.model_matrix().to_cols_array().iter()) {
            assert_relative_eq!(a, b);
        }
        let facing = transform.rotation() * Vec3::NEG_Z;
        assert_relative_eq!(facing.x, -1.0, epsilon = 1e-5);

        let material = &scene.entity(cube).unwrap().component::<Render3d>().unwrap().material;
        assert_eq!(
            material.uniform("view_projection"),
            Some(scene.camera.view_projection().into()),
        );
        assert_eq!(material.uniform("ambient_strength"), Some(0.2f32.into()));
        assert_eq!(material.uniform("view_position"), Some(Vec3::new(0.0, 0.0, 3.0).into()));
        assert_eq!(material.uniform("specular_strength"), Some(0.5f32.into()));
    }

    #[test]
    fn camera_updates_before_components_prepare() {
        let mut scene = Scene::default();
        let cube = scene.spawn("cube", None).unwrap();
        scene.entity_mut(cube).unwrap().add_component(render3d(0));

        let mut input = FrameInput::default();
        input.movement.set(Movement::Forward, true);
        scene.update(&input, &frame(1.0));

        assert_relative_eq!(scene.camera.position().z, -2.5, epsilon = 1e-5);
        let expected = scene.camera.compute_view_projection(Viewport::new(800, 600).aspect());
        let material = &scene.entity(cube).unwrap().component::<Render3d>().unwrap().material;
        assert_eq!(material.uniform("view_projection"), Some(expected.into()));
    }

    #[test]
    fn children_inherit_their_parents_pose() {
        let mut scene = Scene::default();
        let parent = scene.spawn("parent", None).unwrap();
        let child = scene.spawn("child", Some(parent)).unwrap();
        scene.transform_mut(parent).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));
        scene.transform_mut(child).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        scene.entity_mut(child).unwrap().add_component(render3d(0));

        scene.update(&FrameInput::default(), &frame(0.016));

        let origin = model_of(&scene, child).transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(origin.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(origin.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn overlay_is_drawn_after_world() {
        let mut scene = Scene::default();
        let hud = scene.spawn("hud", None).unwrap();
        scene
            .entity_mut(hud)
            .unwrap()
            .add_component(Render2d::new(MeshId(9), Material::new(ShaderId(1), None)));
        for mesh in 0..2 {
            let node = scene.spawn(format!("cube {}", mesh), None).unwrap();
            scene.entity_mut(node).unwrap().add_component(render3d(mesh));
        }

        let items = scene.draw_list();

        let order: Vec<_> = items.iter().map(|item| (item.layer, item.mesh)).collect();
        assert_eq!(
            order,
            [
                (Layer::World, MeshId(0)),
                (Layer::World, MeshId(1)),
                (Layer::Overlay, MeshId(9)),
            ],
        );
    }
}
