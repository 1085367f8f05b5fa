// SPDX-License-Identifier: MPL-2.0

//! Shader sources and the interface they expose to materials.

use std::path::Path;

use crate::{
    error::Error,
    uniform::{UniformKind, UniformLayout},
    Result,
};

/// Everything needed to compile a shader program.
///
/// The source is WGSL containing both a vertex and a fragment entry point. The shader reads its
/// uniform struct from `@group(0) @binding(0)`; textured shaders also read a `texture_2d<f32>` and
/// a sampler from `@group(1)` bindings 0 and 1.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderDescriptor {
    pub label: String,
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// The fields of the uniform struct, in declaration order.
    pub uniforms: UniformLayout,
    pub textured: bool,
    /// Whether draws are depth-tested against, and write to, the depth buffer.
    pub depth_test: bool,
}

impl ShaderDescriptor {
    pub fn new(
        label: impl Into<String>,
        source: impl Into<String>,
        uniforms: UniformLayout,
    ) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: "vs_main".to_owned(),
            fragment_entry: "fs_main".to_owned(),
            uniforms,
            textured: false,
            depth_test: true,
        }
    }

    /// Reads WGSL source from a file. The label is the file name.
    pub fn from_file(path: impl AsRef<Path>, uniforms: UniformLayout) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(label, source, uniforms))
    }

    pub fn textured(mut self, textured: bool) -> Self {
        self.textured = textured;
        self
    }

    pub fn depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }

    /// Lit, textured meshes in world space.
    ///
    /// Uniforms: `model`, `view_projection`, `light_position`, `ambient_strength`,
    /// `view_position` and `specular_strength`.
    pub fn object() -> Self {
        Self::new(
            "object",
            include_str!("renderer/shaders/object.wgsl"),
            UniformLayout::new([
                ("model", UniformKind::Mat4),
                ("view_projection", UniformKind::Mat4),
                ("light_position", UniformKind::Vec3),
                ("ambient_strength", UniformKind::Float),
                ("view_position", UniformKind::Vec3),
                ("specular_strength", UniformKind::Float),
            ]),
        )
        .textured(true)
    }

    /// Flat-colored geometry given directly in clip space, drawn over everything else.
    ///
    /// Uniforms: `color`.
    pub fn overlay() -> Self {
        Self::new(
            "overlay",
            include_str!("renderer/shaders/overlay.wgsl"),
            UniformLayout::new([("color", UniformKind::Vec3)]),
        )
        .depth_test(false)
    }
}
