//! Readback backend interface.
//!
//! Reading back the framebuffer stalls the GPU pipeline. It is isolated here so that a backend may
//! implement it in any way it sees fit as long as the texels end up in CPU memory.

use crate::readback::ReadbackError;

/// Framebuffer readback.
pub unsafe trait Readback {
  /// Copy the `size` lower-left region of the current framebuffer into `texels`, as tightly packed
  /// RGBA8 rows, bottom row first.
  ///
  /// `texels` is exactly `4 * size[0] * size[1]` bytes long.
  unsafe fn read_pixels(&mut self, size: [u32; 2], texels: &mut [u8]) -> Result<(), ReadbackError>;
}
