//! Face-texture synthesis.
//!
//! The UV pass renders, for every pixel covered by the face mesh, the texture coordinate of the
//! mesh at that pixel (`R = u·255`, `G = v·255`, `B = 0`). Background pixels keep the UV clear
//! colour, which has a nonzero blue channel. Combining that buffer with a readback of the camera
//! frame tells, for every covered pixel, which texel of the canonical face texture it shows.
//!
//! [`remap`] performs that correspondence solve on the CPU and writes camera colours into an
//! [`AtlasImage`]. [`FaceTextureSynthesizer`] wraps it and uploads the result to a GPU texture,
//! regenerating mipmaps since effects sample the atlas at varying distances.
//!
//! The atlas is never cleared: texels no covered pixel maps to keep whatever they held before.

use log::trace;
use std::error;
use std::fmt;

use crate::backend::texture::Texture as TextureBackend;
use crate::context::GraphicsContext;
use crate::pixel::{PixelBuffer, PIXEL_SIZE};
use crate::texture::{BoundTexture, GenMipmaps, Sampler, Texture, TextureError};

/// Width of the face texture.
pub const ATLAS_WIDTH: u32 = 256;

/// Height of the face texture.
pub const ATLAS_HEIGHT: u32 = 256;

/// Channel of the UV buffer holding the coverage sentinel; `0` means the face covers the pixel.
pub const COVERAGE_CHANNEL: usize = 2;

/// Orientation of the v axis of the face texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VAxis {
  /// `atlas_y = floor(v * height)`.
  Direct,
  /// `atlas_y = floor((1 - v) * height)`.
  Flipped,
}

impl Default for VAxis {
  fn default() -> Self {
    VAxis::Direct
  }
}

/// The 256×256 RGBA8 face texture, CPU side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AtlasImage {
  texels: Vec<u8>,
}

impl AtlasImage {
  /// A fully transparent black atlas.
  pub fn new() -> Self {
    AtlasImage {
      texels: vec![0; ATLAS_WIDTH as usize * ATLAS_HEIGHT as usize * PIXEL_SIZE],
    }
  }

  /// An atlas filled with a single texel value.
  pub fn filled(texel: [u8; 4]) -> Self {
    let mut atlas = AtlasImage::new();

    for chunk in atlas.texels.chunks_exact_mut(PIXEL_SIZE) {
      chunk.copy_from_slice(&texel);
    }

    atlas
  }

  /// Texel at `(x, y)`, if in bounds.
  pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= ATLAS_WIDTH || y >= ATLAS_HEIGHT {
      return None;
    }

    let i = (y as usize * ATLAS_WIDTH as usize + x as usize) * PIXEL_SIZE;
    let t = &self.texels[i..i + PIXEL_SIZE];
    Some([t[0], t[1], t[2], t[3]])
  }

  /// Raw texels, rows of [`ATLAS_WIDTH`] texels.
  pub fn as_slice(&self) -> &[u8] {
    &self.texels
  }
}

impl Default for AtlasImage {
  fn default() -> Self {
    AtlasImage::new()
  }
}

/// What a synthesis run did.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct SynthesisStats {
  /// Pixels the face covered.
  pub covered: usize,
  /// Covered pixels that landed inside the atlas.
  pub written: usize,
}

/// Errors that might happen while synthesizing the face texture.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SynthesisError {
  /// The UV and colour buffers don’t have the same dimensions.
  SizeMismatch {
    /// Size of the UV buffer.
    uv: [u32; 2],
    /// Size of the colour buffer.
    color: [u32; 2],
  },
  /// The atlas texture couldn’t be uploaded.
  Texture(TextureError),
}

impl fmt::Display for SynthesisError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      SynthesisError::SizeMismatch { uv, color } => write!(
        f,
        "UV buffer is {}×{} but colour buffer is {}×{}",
        uv[0], uv[1], color[0], color[1]
      ),

      SynthesisError::Texture(ref e) => write!(f, "cannot upload face texture: {}", e),
    }
  }
}

impl error::Error for SynthesisError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      SynthesisError::Texture(e) => Some(e),
      _ => None,
    }
  }
}

impl From<TextureError> for SynthesisError {
  fn from(e: TextureError) -> Self {
    SynthesisError::Texture(e)
  }
}

/// Atlas cell a UV texel maps to, if any.
///
/// `u` and `v` are decoded as `channel / 255`, so a channel of 255 maps to `1.0`, which lies
/// outside of the atlas.
pub fn atlas_coords(r: u8, g: u8, v_axis: VAxis) -> Option<(u32, u32)> {
  let u = r as f64 / 255.;
  let v = g as f64 / 255.;
  let v = match v_axis {
    VAxis::Direct => v,
    VAxis::Flipped => 1. - v,
  };

  let x = (u * ATLAS_WIDTH as f64).floor();
  let y = (v * ATLAS_HEIGHT as f64).floor();

  if x < 0. || y < 0. || x >= ATLAS_WIDTH as f64 || y >= ATLAS_HEIGHT as f64 {
    return None;
  }

  Some((x as u32, y as u32))
}

/// Write the camera colour of every covered pixel into the atlas.
///
/// Pixels are visited in buffer order; when several land on the same texel, the last one wins.
/// Written texels get an alpha of 255.
pub fn remap(
  uv: &PixelBuffer,
  color: &PixelBuffer,
  atlas: &mut AtlasImage,
  v_axis: VAxis,
) -> Result<SynthesisStats, SynthesisError> {
  if uv.size() != color.size() || uv.as_slice().len() != color.as_slice().len() {
    return Err(SynthesisError::SizeMismatch {
      uv: uv.size(),
      color: color.size(),
    });
  }

  let mut stats = SynthesisStats::default();
  let uv_texels = uv.as_slice().chunks_exact(PIXEL_SIZE);
  let color_texels = color.as_slice().chunks_exact(PIXEL_SIZE);

  for (uv_texel, color_texel) in uv_texels.zip(color_texels) {
    if uv_texel[COVERAGE_CHANNEL] != 0 {
      continue;
    }

    stats.covered += 1;

    if let Some((x, y)) = atlas_coords(uv_texel[0], uv_texel[1], v_axis) {
      let i = (y as usize * ATLAS_WIDTH as usize + x as usize) * PIXEL_SIZE;
      let dst = &mut atlas.texels[i..i + PIXEL_SIZE];

      dst[..3].copy_from_slice(&color_texel[..3]);
      dst[3] = 255;
      stats.written += 1;
    }
  }

  Ok(stats)
}

/// Owner of the face texture, CPU and GPU sides.
pub struct FaceTextureSynthesizer<B>
where
  B: ?Sized + TextureBackend,
{
  image: AtlasImage,
  texture: Texture<B>,
  v_axis: VAxis,
}

impl<B> FaceTextureSynthesizer<B>
where
  B: ?Sized + TextureBackend,
{
  /// Allocate the atlas texture.
  pub fn new<C>(ctx: &mut C, sampler: Sampler, v_axis: VAxis) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let texture = Texture::new(ctx, [ATLAS_WIDTH, ATLAS_HEIGHT], sampler)?;

    Ok(FaceTextureSynthesizer {
      image: AtlasImage::new(),
      texture,
      v_axis,
    })
  }

  /// Remap the readback buffers into the atlas and upload it.
  pub fn synthesize(
    &mut self,
    uv: &PixelBuffer,
    color: &PixelBuffer,
  ) -> Result<SynthesisStats, SynthesisError> {
    let stats = remap(uv, color, &mut self.image, self.v_axis)?;
    trace!(
      "face texture: {} covered pixels, {} written",
      stats.covered,
      stats.written
    );

    self.texture.upload_raw(GenMipmaps::Yes, self.image.as_slice())?;
    Ok(stats)
  }

  /// CPU side of the atlas.
  pub fn image(&self) -> &AtlasImage {
    &self.image
  }

  /// Orientation of the v axis.
  pub fn v_axis(&self) -> VAxis {
    self.v_axis
  }

  /// Bind the atlas texture to a texture unit.
  pub fn bind(&mut self, unit: u32) -> BoundTexture<'_, B> {
    self.texture.bind(unit)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BACKGROUND: [u8; 4] = [0, 0, 255, 255];

  fn buffers(size: [u32; 2]) -> (PixelBuffer, PixelBuffer) {
    let mut uv = PixelBuffer::new();
    uv.ensure_size(size);

    for y in 0..size[1] {
      for x in 0..size[0] {
        uv.set_texel(x, y, BACKGROUND);
      }
    }

    let mut color = PixelBuffer::new();
    color.ensure_size(size);

    (uv, color)
  }

  #[test]
  fn end_to_end_scenario() {
    let (mut uv, mut color) = buffers([4, 4]);
    uv.set_texel(0, 0, [128, 64, 0, 255]);
    uv.set_texel(1, 1, [255, 255, 0, 255]);
    color.set_texel(0, 0, [10, 20, 30, 0]);
    color.set_texel(1, 1, [200, 100, 50, 0]);

    for &v_axis in &[VAxis::Direct, VAxis::Flipped] {
      let before = AtlasImage::filled([1, 2, 3, 4]);
      let mut atlas = before.clone();
      let stats = remap(&uv, &color, &mut atlas, v_axis).unwrap();

      // u = 1.0 lands on column 256, which doesn’t exist
      assert_eq!(stats, SynthesisStats { covered: 2, written: 1 });

      let y = match v_axis {
        VAxis::Direct => 64,
        VAxis::Flipped => 191,
      };
      assert_eq!(atlas.texel(128, y), Some([10, 20, 30, 255]));

      for ty in 0..ATLAS_HEIGHT {
        for tx in 0..ATLAS_WIDTH {
          if (tx, ty) != (128, y) {
            assert_eq!(atlas.texel(tx, ty), before.texel(tx, ty));
          }
        }
      }
    }
  }

  #[test]
  fn covered_pixels_copy_colour_with_opaque_alpha() {
    let (mut uv, mut color) = buffers([3, 2]);

    for y in 0..2 {
      for x in 0..3 {
        let r = (x * 80) as u8;
        let g = (y * 100) as u8;
        uv.set_texel(x, y, [r, g, 0, 255]);
        color.set_texel(x, y, [r, g, 7, 12]);
      }
    }

    let mut atlas = AtlasImage::new();
    let stats = remap(&uv, &color, &mut atlas, VAxis::Direct).unwrap();
    assert_eq!(stats, SynthesisStats { covered: 6, written: 6 });

    for y in 0..2 {
      for x in 0..3 {
        let (r, g) = ((x * 80) as u8, (y * 100) as u8);
        let (ax, ay) = atlas_coords(r, g, VAxis::Direct).unwrap();
        assert_eq!(atlas.texel(ax, ay), Some([r, g, 7, 255]));
      }
    }
  }

  #[test]
  fn background_leaves_atlas_untouched() {
    let (uv, mut color) = buffers([8, 8]);
    color.set_texel(3, 3, [255, 255, 255, 255]);

    let before = AtlasImage::filled([9, 9, 9, 9]);
    let mut atlas = before.clone();
    let stats = remap(&uv, &color, &mut atlas, VAxis::Direct).unwrap();

    assert_eq!(stats, SynthesisStats::default());
    assert_eq!(atlas, before);
  }

  #[test]
  fn last_writer_wins() {
    let (mut uv, mut color) = buffers([2, 1]);
    uv.set_texel(0, 0, [10, 10, 0, 0]);
    uv.set_texel(1, 0, [10, 10, 0, 0]);
    color.set_texel(0, 0, [1, 1, 1, 1]);
    color.set_texel(1, 0, [2, 2, 2, 2]);

    let mut atlas = AtlasImage::new();
    remap(&uv, &color, &mut atlas, VAxis::Direct).unwrap();

    let (x, y) = atlas_coords(10, 10, VAxis::Direct).unwrap();
    assert_eq!(atlas.texel(x, y), Some([2, 2, 2, 255]));
  }

  #[test]
  fn same_input_same_atlas() {
    let (mut uv, mut color) = buffers([16, 16]);

    for y in 0..16 {
      for x in 0..16 {
        let sentinel = if (x + y) % 3 == 0 { 1 } else { 0 };
        uv.set_texel(x, y, [(x * 17) as u8, (y * 16) as u8, sentinel, 255]);
        color.set_texel(x, y, [(x * y) as u8, x as u8, y as u8, 255]);
      }
    }

    let mut first = AtlasImage::new();
    remap(&uv, &color, &mut first, VAxis::Flipped).unwrap();
    let mut second = first.clone();
    remap(&uv, &color, &mut second, VAxis::Flipped).unwrap();

    assert_eq!(first, second);
  }

  #[test]
  fn bounds() {
    for r in 0..=255u8 {
      for g in 0..=255u8 {
        for &v_axis in &[VAxis::Direct, VAxis::Flipped] {
          if let Some((x, y)) = atlas_coords(r, g, v_axis) {
            assert!(x < ATLAS_WIDTH && y < ATLAS_HEIGHT);
          }
        }
      }
    }

    assert_eq!(atlas_coords(255, 0, VAxis::Direct), None);
    assert_eq!(atlas_coords(0, 255, VAxis::Direct), None);
    assert_eq!(atlas_coords(0, 255, VAxis::Flipped), Some((0, 0)));
    assert_eq!(atlas_coords(0, 0, VAxis::Flipped), None);
    assert_eq!(atlas_coords(254, 254, VAxis::Direct), Some((254, 254)));
  }

  #[test]
  fn size_mismatch() {
    let (uv, _) = buffers([4, 4]);
    let (_, color) = buffers([4, 3]);
    let mut atlas = AtlasImage::new();

    assert_eq!(
      remap(&uv, &color, &mut atlas, VAxis::Direct),
      Err(SynthesisError::SizeMismatch {
        uv: [4, 4],
        color: [4, 3]
      })
    );
  }
}
