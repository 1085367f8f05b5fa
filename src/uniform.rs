// SPDX-License-Identifier: MPL-2.0

//! Shader uniform values and their byte layout.
//!
//! A shader declares a single uniform struct; its [`UniformLayout`] lists the struct's fields in
//! declaration order. Values set on a [material](crate::Material) are packed against that layout
//! right before each draw.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    linear::{Mat3, Mat4, Vec3},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Int(_) => UniformKind::Int,
            Self::Float(_) => UniformKind::Float,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Mat3(_) => UniformKind::Mat3,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            Self::Int(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Float(v) => out[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec3(v) => out[..12].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Mat3(m) => {
                // Each column is padded out to a vec4.
                for (i, column) in [m.x_axis, m.y_axis, m.z_axis].iter().enumerate() {
                    out[i * 16..i * 16 + 12].copy_from_slice(bytemuck::bytes_of(column));
                }
            }
            Self::Mat4(m) => out[..64].copy_from_slice(bytemuck::bytes_of(m)),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        Self::Mat3(m)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(m)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Mat3,
    Mat4,
}

impl UniformKind {
    /// Alignment in the WGSL uniform address space.
    pub const fn align(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec3 | Self::Mat3 | Self::Mat4 => 16,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec3 => 12,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
        }
    }
}

/// Uniform values by name.
pub type Uniforms = BTreeMap<String, UniformValue>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: usize,
}

/// The byte layout of a shader's uniform struct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: usize,
}

const fn align_to(offset: usize, align: usize) -> usize {
    (offset + align - 1) / align * align
}

impl UniformLayout {
    /// Lays out fields in declaration order.
    pub fn new<'a>(fields: impl IntoIterator<Item = (&'a str, UniformKind)>) -> Self {
        let mut offset = 0;
        let mut max_align = 16;
        let fields = fields
            .into_iter()
            .map(|(name, kind)| {
                offset = align_to(offset, kind.align());
                let field = UniformField {
                    name: name.to_owned(),
                    kind,
                    offset,
                };
                offset += kind.size();
                max_align = max_align.max(kind.align());

                field
            })
            .collect();

        Self {
            fields,
            size: align_to(offset, max_align),
        }
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Size of the struct in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Writes `values` at their offsets. Fields without a value are left zeroed.
    pub fn pack(&self, values: &Uniforms) -> Result<Vec<u8>> {
        let mut bytes = vec![0; self.size];

        for (name, value) in values {
            let field = self
                .field(name)
                .ok_or_else(|| Error::UnknownUniform(name.clone()))?;
            if field.kind != value.kind() {
                return Err(Error::UniformTypeMismatch {
                    name: name.clone(),
                    expected: field.kind,
                    found: value.kind(),
                });
            }

            value.write(&mut bytes[field.offset..field.offset + field.kind.size()]);
        }

        Ok(bytes)
    }
}
