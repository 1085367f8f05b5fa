// SPDX-License-Identifier: MPL-2.0

//! A small 3D engine: transforms, a free-look camera, a scene of component-driven entities, and a
//! wgpu renderer.
//!
//! # Coordinate Spaces
//!
//! There are four coordinate spaces: **mesh** space, **world** space, **camera** space, and
//! **clip** space. All of them are right-handed with +Y up.
//!
//! ## Mesh Space
//!
//! Each mesh has an associated mesh space where the origin is considered the 'center' of the mesh.
//! Meshes are scaled and rotated about this origin.
//!
//! ## World Space
//!
//! Each entity's [model matrix](Transform::model_matrix) scales, then rotates, then translates
//! its mesh into the space of its parent; composing model matrices up the [scene
//! tree](tree::SceneTree) yields world space.
//!
//! ## Camera Space
//!
//! Once all entities are in world space, we transform *the world itself* such that the GPU only
//! renders what the camera sees. The [view matrix](Camera::view_matrix) translates the world by
//! the negated camera position and then rotates it, which leaves the camera at the origin looking
//! down -Z.
//!
//! ## Clip Space
//!
//! Clip space is the final destination for vertices and is produced by the camera's perspective
//! [projection](camera::Frustum::projection). Depth runs from 0 at the near plane to 1 at the far
//! plane. Overlay meshes, such as a crosshair, are given directly in clip space.
//!
//! # Frames
//!
//! Each frame, the application drains its [`InputState`] into a [`FrameInput`], ticks a
//! [`FrameClock`] for a [`FrameContext`], and calls [`Scene::update`] followed by
//! [`Renderer::render`].

pub mod camera;
pub mod component;
mod error;
pub mod frame;
pub mod input;
pub mod linear;
pub mod material;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod transform;
pub mod tree;
pub mod uniform;

pub use camera::{Camera, CameraConfig, Frustum, FrustumConfig};
pub use component::{Capability, Component, Entity, Lighting, Render2d, Render3d, Spin};
pub use error::{Error, Result};
pub use frame::{FrameClock, FrameContext, Viewport};
pub use input::{FrameInput, InputState, Movement};
pub use linear::AxisConvention;
pub use material::Material;
pub use mesh::Mesh;
pub use renderer::Renderer;
pub use scene::Scene;
pub use shader::ShaderDescriptor;
pub use texture::{Filtering, TextureData};
pub use transform::Transform;
pub use tree::NodeIndex;
