// SPDX-License-Identifier: MPL-2.0

//! Triangle meshes and OBJ loading.

use std::{fs::File, io::{BufRead, BufReader}, path::Path};

use crate::{error::Error, linear::Vec3, Result};

/// A handle to a mesh on the GPU, issued by
/// [`Renderer::upload_mesh`](crate::Renderer::upload_mesh).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// The integral type for indexing a mesh's [vertices](Mesh::vertices).
pub type MeshVertexIndex = u32;

/// A vertex within a [mesh](Mesh).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// The location of this vertex in mesh space.
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            color: [1.0, 1.0, 1.0],
            tex_coord: [0.0, 0.0],
            normal: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    /// Triads of indices into [`Self::vertices`], one per triangle.
    pub indices: Vec<MeshVertexIndex>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Loads every model in an OBJ file into a single mesh.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let base = path.parent().map(Path::to_owned).unwrap_or_default();

        let (models, materials) = tobj::load_obj_buf(
            &mut BufReader::new(file),
            &load_options(),
            |mtl| tobj::load_mtl(base.join(mtl)),
        )
        .map_err(|source| Error::MeshLoad {
            path: Some(path.to_owned()),
            source,
        })?;

        match materials {
            Ok(materials) => tracing::debug!("{} material(s) declared", materials.len()),
            Err(e) => tracing::debug!("no materials loaded: {}", e),
        }
        let mesh = Self::from_models(&models);
        tracing::info!(
            "Loaded '{}': {} model(s), {} vertices, {} triangles",
            path.display(),
            models.len(),
            mesh.vertices.len(),
            mesh.triangle_count(),
        );

        Ok(mesh)
    }

    /// Parses OBJ data from a reader. `mtllib` statements are ignored.
    pub fn from_obj_reader(reader: &mut impl BufRead) -> Result<Self> {
        let (models, _) = tobj::load_obj_buf(reader, &load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|source| Error::MeshLoad { path: None, source })?;

        Ok(Self::from_models(&models))
    }

    fn from_models(models: &[tobj::Model]) -> Self {
        let mut mesh = Self::default();

        for model in models {
            let source = &model.mesh;
            let base = mesh.vertices.len() as MeshVertexIndex;
            let vertex_count = source.positions.len() / 3;
            let has_normals = source.normals.len() >= vertex_count * 3;

            for i in 0..vertex_count {
                let mut vertex = Vertex::new([
                    source.positions[3 * i],
                    source.positions[3 * i + 1],
                    source.positions[3 * i + 2],
                ]);
                if let Some(uv) = source.texcoords.get(2 * i..2 * i + 2) {
                    vertex.tex_coord = [uv[0], uv[1]];
                }
                if let Some(rgb) = source.vertex_color.get(3 * i..3 * i + 3) {
                    vertex.color = [rgb[0], rgb[1], rgb[2]];
                }
                if has_normals {
                    vertex.normal = [
                        source.normals[3 * i],
                        source.normals[3 * i + 1],
                        source.normals[3 * i + 2],
                    ];
                }
                mesh.vertices.push(vertex);
            }

            let first_index = mesh.indices.len();
            mesh.indices.extend(source.indices.iter().map(|&i| base + i));

            if !has_normals {
                compute_normals(&mut mesh.vertices[base as usize..], &source.indices);
                tracing::debug!("Computed normals for model '{}'", model.name);
            }
            debug_assert_eq!((mesh.indices.len() - first_index) % 3, 0);
        }

        mesh
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Area-weighted vertex normals from the triangles in `indices`.
fn compute_normals(vertices: &mut [Vertex], indices: &[MeshVertexIndex]) {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let [pa, pb, pc] = [a, b, c].map(|i| Vec3::from(vertices[i].position));
        let face = (pb - pa).cross(pc - pa);

        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for (vertex, normal) in vertices.iter_mut().zip(normals) {
        vertex.normal = normal.normalize_or_zero().to_array();
    }
}

// Built-in meshes.
impl Mesh {
    /// A unit cube centered on the origin with per-face normals and texture coordinates.
    pub fn cube() -> Self {
        // (normal, tangent-right, tangent-up) per face.
        const FACES: [[[f32; 3]; 3]; 6] = [
            [[0., 0., 1.], [1., 0., 0.], [0., 1., 0.]],
            [[0., 0., -1.], [-1., 0., 0.], [0., 1., 0.]],
            [[1., 0., 0.], [0., 0., -1.], [0., 1., 0.]],
            [[-1., 0., 0.], [0., 0., 1.], [0., 1., 0.]],
            [[0., 1., 0.], [1., 0., 0.], [0., 0., -1.]],
            [[0., -1., 0.], [1., 0., 0.], [0., 0., 1.]],
        ];
        const CORNERS: [[f32; 2]; 4] = [[-1., -1.], [1., -1.], [1., 1.], [-1., 1.]];

        let mut mesh = Self::default();
        for [normal, right, up] in FACES {
            let [n, r, u] = [normal, right, up].map(Vec3::from);
            let base = mesh.vertices.len() as MeshVertexIndex;

            for [x, y] in CORNERS {
                let position = (n + r * x + u * y) * 0.5;
                mesh.vertices.push(Vertex {
                    position: position.to_array(),
                    color: [1.0, 1.0, 1.0],
                    tex_coord: [(x + 1.0) / 2.0, (y + 1.0) / 2.0],
                    normal,
                });
            }
            mesh.indices.extend([0, 1, 2, 0, 2, 3].iter().map(|i| base + i));
        }

        mesh
    }

    /// A crosshair in clip space, made of one horizontal and one vertical bar.
    pub fn crosshair() -> Self {
        const BARS: [[f32; 2]; 2] = [[0.025, 0.002], [0.002, 0.04]];

        let mut mesh = Self::default();
        for [w, h] in BARS {
            let base = mesh.vertices.len() as MeshVertexIndex;
            for [x, y] in [[-w, -h], [w, -h], [w, h], [-w, h]] {
                mesh.vertices.push(Vertex::new([x, y, 0.0]));
            }
            mesh.indices.extend([0, 1, 2, 0, 2, 3].iter().map(|i| base + i));
        }

        mesh
    }
}
