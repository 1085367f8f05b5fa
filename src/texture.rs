// SPDX-License-Identifier: MPL-2.0

//! Decoded texture images.

use std::path::Path;

use crate::{error::Error, Result};

/// How a texture is sampled between texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filtering {
    #[default]
    Nearest,
    Linear,
}

/// An RGBA8 image, bottom row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decodes an image file.
    ///
    /// The image is flipped vertically so that its first row is the bottom of the picture, which
    /// is where OBJ texture coordinates place `v = 0`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| Error::TextureLoad {
            path: Some(path.to_owned()),
            source,
        })?;
        let texture = Self::from_image(image);
        tracing::info!(
            "Loaded texture '{}': {}x{}",
            path.display(),
            texture.width,
            texture.height,
        );

        Ok(texture)
    }

    /// Decodes an in-memory image in any supported format. Like [`Self::load`], rows are flipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        image::load_from_memory(bytes)
            .map(Self::from_image)
            .map_err(|source| Error::TextureLoad { path: None, source })
    }

    fn from_image(image: image::DynamicImage) -> Self {
        let rgba = image.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    /// A single texel of one color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// A square checkerboard of `size` texels with cells `cell` texels wide.
    pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let pixels = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .flat_map(|(x, y)| if (x / cell + y / cell) % 2 == 0 { a } else { b })
            .collect();

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    /// The bytes of one row of texels.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;

        &self.pixels[start..start + stride]
    }
}
