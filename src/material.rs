// SPDX-License-Identifier: MPL-2.0

use crate::uniform::{UniformValue, Uniforms};

/// A handle to a compiled shader, issued by
/// [`Renderer::create_shader`](crate::Renderer::create_shader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) usize);

/// A handle to a texture on the GPU, issued by
/// [`Renderer::upload_texture`](crate::Renderer::upload_texture).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// A shader, an optional texture, and the uniform values the shader is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shader: ShaderId,
    /// Untextured materials are drawn with a white texel.
    pub texture: Option<TextureId>,
    uniforms: Uniforms,
}

impl Material {
    pub fn new(shader: ShaderId, texture: Option<TextureId>) -> Self {
        Self {
            shader,
            texture,
            uniforms: Uniforms::new(),
        }
    }

    /// Sets, or overwrites, the value of a uniform.
    ///
    /// Names and types are checked against the shader when the material is drawn.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.uniforms.insert(name.to_owned(), value);
            }
        }
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::Vec3;

    #[test]
    fn set_uniform_overwrites() {
        let mut material = Material::new(ShaderId(0), None);
        material.set_uniform("ambient_strength", 0.2f32);
        material.set_uniform("ambient_strength", 0.4f32);
        material.set_uniform("light_position", Vec3::new(2.0, 5.0, 5.0));

        assert_eq!(material.uniforms().len(), 2);
        assert_eq!(material.uniform("ambient_strength"), Some(UniformValue::Float(0.4)));
        assert_eq!(material.uniform("missing"), None);
    }
}
