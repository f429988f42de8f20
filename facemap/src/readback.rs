//! Framebuffer readback.
//!
//! Two buffers are read back every frame: the camera background (before anything face-related is
//! drawn) and the UV pass output. Both are kept across frames in [`ReadbackBuffers`] and only
//! reallocated when the surface size changes.

use log::debug;
use std::error;
use std::fmt;

use crate::backend::readback::Readback;
use crate::context::GraphicsContext;
use crate::pixel::{byte_len, PixelBuffer};

/// Errors that might happen when reading back the framebuffer.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadbackError {
  /// The destination doesn’t have the size of the region to read.
  SizeMismatch {
    /// Bytes needed.
    expected: usize,
    /// Bytes available.
    actual: usize,
  },
  /// The backend failed to read the framebuffer.
  Failed(String),
}

impl fmt::Display for ReadbackError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ReadbackError::SizeMismatch { expected, actual } => write!(
        f,
        "readback destination mismatch: {} bytes expected, {} available",
        expected, actual
      ),

      ReadbackError::Failed(ref e) => write!(f, "cannot read framebuffer: {}", e),
    }
  }
}

impl error::Error for ReadbackError {}

/// The two per-frame readback destinations.
#[derive(Clone, Debug, Default)]
pub struct ReadbackBuffers {
  /// Camera background.
  pub color: PixelBuffer,
  /// UV pass output.
  pub uv: PixelBuffer,
}

impl ReadbackBuffers {
  /// Empty buffers; they get allocated on the first [`ReadbackBuffers::ensure`].
  pub fn new() -> Self {
    ReadbackBuffers::default()
  }

  /// Make both buffers match the surface size.
  pub fn ensure(&mut self, size: [u32; 2]) {
    let reallocated = self.color.ensure_size(size);
    let reallocated = self.uv.ensure_size(size) || reallocated;

    if reallocated {
      debug!("allocating pixel buffers of size {}", byte_len(size));
    }
  }
}

/// Read the current framebuffer into `buffer`, over the whole size of the buffer.
pub fn read_pixels<C>(ctx: &mut C, buffer: &mut PixelBuffer) -> Result<(), ReadbackError>
where
  C: GraphicsContext,
  C::Backend: Readback,
{
  let size = buffer.size();
  let expected = byte_len(size);
  let texels = buffer.as_mut_slice();

  if texels.len() != expected {
    return Err(ReadbackError::SizeMismatch {
      expected,
      actual: texels.len(),
    });
  }

  unsafe { ctx.backend().read_pixels(size, texels) }
}
