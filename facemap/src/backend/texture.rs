//! Texture backend interface.
//!
//! Only what the pipeline needs is exposed: 2D RGBA8 textures, uploaded wholesale, optionally
//! followed by mipmap generation, and bound to a texture unit.

use crate::texture::{GenMipmaps, Sampler, TextureError};

/// 2D RGBA8 textures.
pub unsafe trait Texture {
  /// Backend representation of a texture.
  type TextureRepr;

  /// Create a new texture. Its storage is undefined until the first upload.
  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    sampler: Sampler,
  ) -> Result<Self::TextureRepr, TextureError>;

  /// Replace the whole texture with `texels` (tightly packed RGBA8 rows, bottom row first).
  unsafe fn upload_rgba8(
    texture: &mut Self::TextureRepr,
    size: [u32; 2],
    texels: &[u8],
    mipmaps: GenMipmaps,
  ) -> Result<(), TextureError>;

  /// Bind the texture to a texture unit.
  unsafe fn bind(texture: &mut Self::TextureRepr, unit: u32);

  /// Unbind whatever texture is bound on a texture unit.
  unsafe fn unbind(texture: &mut Self::TextureRepr, unit: u32);
}
