// SPDX-License-Identifier: MPL-2.0

use std::{fmt, path::PathBuf};

use crate::uniform::UniformKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    NoCompatibleAdapterFound,
    NoCompatibleDeviceFound,
    /// The surface could not produce a frame for a reason other than being lost or outdated.
    Surface(wgpu::SurfaceError),
    ShaderCompilation {
        label: String,
        message: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    MeshLoad {
        path: Option<PathBuf>,
        source: tobj::LoadError,
    },
    TextureLoad {
        path: Option<PathBuf>,
        source: image::ImageError,
    },
    UnknownUniform(String),
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
    /// A [`NodeIndex`](crate::tree::NodeIndex) refers to a node that was removed.
    StaleNode,
    /// Re-parenting would make a node its own ancestor.
    CyclicParent,
    /// A mesh, texture or shader handle was not created by this renderer.
    UnknownResource(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCompatibleAdapterFound => f.write_str("no compatible graphics adapter found"),
            Self::NoCompatibleDeviceFound => f.write_str("no compatible graphics device found"),
            Self::Surface(e) => write!(f, "surface error: {}", e),
            Self::ShaderCompilation { label, message } => {
                write!(f, "failed to compile shader '{}': {}", label, message)
            }
            Self::Io { path, .. } => write!(f, "failed to read '{}'", path.display()),
            Self::MeshLoad { path: Some(path), .. } => {
                write!(f, "failed to load OBJ file '{}'", path.display())
            }
            Self::MeshLoad { path: None, .. } => f.write_str("failed to load OBJ data"),
            Self::TextureLoad { path: Some(path), .. } => {
                write!(f, "failed to load texture '{}'", path.display())
            }
            Self::TextureLoad { path: None, .. } => f.write_str("failed to decode texture data"),
            Self::UnknownUniform(name) => write!(f, "shader has no uniform named '{}'", name),
            Self::UniformTypeMismatch { name, expected, found } => write!(
                f,
                "uniform '{}' expects {:?} but was given {:?}",
                name, expected, found,
            ),
            Self::StaleNode => f.write_str("node index refers to a removed node"),
            Self::CyclicParent => f.write_str("a node cannot become its own ancestor"),
            Self::UnknownResource(kind) => write!(f, "unknown {} handle", kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            Self::MeshLoad { source, .. } => Some(source),
            Self::TextureLoad { source, .. } => Some(source),
            _ => None,
        }
    }
}
