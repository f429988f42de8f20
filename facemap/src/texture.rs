//! Texture API.
//!
//! Textures are 2D RGBA8 images. Two kinds live in the pipeline: the face atlas, re-uploaded every
//! frame with mipmaps regenerated, and static images loaded once from the asset store.

use image::RgbaImage;
use std::error;
use std::fmt;

use crate::backend::texture::Texture as TextureBackend;
use crate::context::GraphicsContext;
use crate::pixel::byte_len;

/// How to wrap texture coordinates while sampling textures?
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
  /// If textures coordinates lay outside of *[0;1]*, they will be clamped to either *0* or *1* for
  /// every components.
  ClampToEdge,
  /// Textures coordinates are repeated if they lay outside of *[0;1]*.
  Repeat,
  /// Same as `Repeat` but it will alternatively repeat between *[0;1]* and *[1;0]*.
  MirroredRepeat,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
  /// Nearest mipmap, nearest texel.
  NearestMipmapNearest,
  /// Nearest mipmap, linear interpolation of texels.
  NearestMipmapLinear,
  /// Linear interpolation between two mipmaps sampled with a nearest filter.
  LinearMipmapNearest,
  /// Linear interpolation between two mipmaps sampled with a linear filter.
  LinearMipmapLinear,
}

impl MinFilter {
  /// Whether sampling with this filter reads mipmap levels.
  pub fn uses_mipmaps(self) -> bool {
    !matches!(self, MinFilter::Nearest | MinFilter::Linear)
  }
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// A `Sampler` object gives hint on how a `Texture` should be sampled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sampler {
  /// How should we wrap around the *s* sampling coordinate?
  pub wrap_s: Wrap,
  /// How should we wrap around the *t* sampling coordinate?
  pub wrap_t: Wrap,
  /// Minification filter.
  pub min_filter: MinFilter,
  /// Magnification filter.
  pub mag_filter: MagFilter,
}

/// Default value is as following:
///
///   - `wrap_s`: `Wrap::ClampToEdge`
///   - `wrap_t`: `Wrap::ClampToEdge`
///   - `min_filter`: `MinFilter::LinearMipmapLinear`
///   - `mag_filter`: `MagFilter::Linear`
impl Default for Sampler {
  fn default() -> Self {
    Sampler {
      wrap_s: Wrap::ClampToEdge,
      wrap_t: Wrap::ClampToEdge,
      min_filter: MinFilter::LinearMipmapLinear,
      mag_filter: MagFilter::Linear,
    }
  }
}

/// Whether mipmaps should be generated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenMipmaps {
  /// Mipmaps should be generated after uploading.
  Yes,
  /// Never generate mipmaps.
  No,
}

/// Errors that might happen when working with textures.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureError {
  /// A texture’s storage failed to be created.
  ///
  /// The carried [`String`] gives the reason of the failure.
  TextureStorageCreationFailed(String),
  /// Not enough pixel data provided for the given area asked.
  ///
  /// The first [`usize`] is the number of expected bytes to be uploaded and the second [`usize`] is
  /// the number you provided.
  NotEnoughPixels(usize, usize),
  /// The backend refused the upload.
  UploadFailed(String),
}

impl fmt::Display for TextureError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      TextureError::TextureStorageCreationFailed(ref e) => {
        write!(f, "texture storage creation failed: {}", e)
      }

      TextureError::NotEnoughPixels(expected, provided) => write!(
        f,
        "not enough texels provided: expected {} bytes, provided {} bytes",
        expected, provided
      ),

      TextureError::UploadFailed(ref e) => write!(f, "texture upload failed: {}", e),
    }
  }
}

impl error::Error for TextureError {}

/// A 2D RGBA8 texture.
pub struct Texture<B>
where
  B: ?Sized + TextureBackend,
{
  repr: B::TextureRepr,
  size: [u32; 2],
}

impl<B> Texture<B>
where
  B: ?Sized + TextureBackend,
{
  /// Create a texture of the given size. Its content is undefined until uploaded.
  pub fn new<C>(ctx: &mut C, size: [u32; 2], sampler: Sampler) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    unsafe {
      ctx
        .backend()
        .new_texture(size, sampler)
        .map(|repr| Texture { repr, size })
    }
  }

  /// Create a texture out of a decoded image.
  ///
  /// Images are stored top row first while textures expect the bottom row first, so the image is
  /// flipped before upload.
  pub fn from_image<C>(
    ctx: &mut C,
    image: &RgbaImage,
    sampler: Sampler,
  ) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let flipped = image::imageops::flip_vertical(image);
    let size = [flipped.width(), flipped.height()];
    let mut texture = Texture::new(ctx, size, sampler)?;

    let mipmaps = if sampler.min_filter.uses_mipmaps() {
      GenMipmaps::Yes
    } else {
      GenMipmaps::No
    };

    texture.upload_raw(mipmaps, flipped.as_raw())?;
    Ok(texture)
  }

  /// Size of the texture.
  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  /// Replace the whole texture.
  pub fn upload_raw(&mut self, gen_mipmaps: GenMipmaps, texels: &[u8]) -> Result<(), TextureError> {
    let expected = byte_len(self.size);

    if texels.len() < expected {
      return Err(TextureError::NotEnoughPixels(expected, texels.len()));
    }

    unsafe { B::upload_rgba8(&mut self.repr, self.size, &texels[..expected], gen_mipmaps) }
  }

  /// Bind the texture to a texture unit until the returned guard is dropped.
  pub fn bind(&mut self, unit: u32) -> BoundTexture<'_, B> {
    unsafe { B::bind(&mut self.repr, unit) };

    BoundTexture {
      repr: &mut self.repr,
      unit,
    }
  }
}

/// A texture bound to a texture unit.
///
/// Dropping it unbinds the unit.
pub struct BoundTexture<'a, B>
where
  B: ?Sized + TextureBackend,
{
  repr: &'a mut B::TextureRepr,
  unit: u32,
}

impl<'a, B> BoundTexture<'a, B>
where
  B: ?Sized + TextureBackend,
{
  /// Texture unit the texture is bound to.
  pub fn unit(&self) -> u32 {
    self.unit
  }
}

impl<'a, B> Drop for BoundTexture<'a, B>
where
  B: ?Sized + TextureBackend,
{
  fn drop(&mut self) {
    unsafe { B::unbind(self.repr, self.unit) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_sampler_is_trilinear() {
    let sampler = Sampler::default();

    assert_eq!(sampler.min_filter, MinFilter::LinearMipmapLinear);
    assert_eq!(sampler.mag_filter, MagFilter::Linear);
    assert!(sampler.min_filter.uses_mipmaps());
    assert!(!MinFilter::Linear.uses_mipmaps());
  }
}
