//! CPU-side RGBA8 pixel buffers.
//!
//! Pixels are stored as tightly packed RGBA8 rows, bottom row first, exactly as the framebuffer
//! readback delivers them. The texel at `(x, y)` thus starts at byte `4 * (y * width + x)`.

/// Number of bytes per pixel.
pub const PIXEL_SIZE: usize = 4;

/// A reusable RGBA8 pixel buffer.
///
/// The storage is only reallocated when the number of bytes needed changes, so that reading back
/// the framebuffer every frame doesn’t hit the allocator.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PixelBuffer {
  size: [u32; 2],
  texels: Vec<u8>,
  allocations: usize,
}

impl PixelBuffer {
  /// An empty buffer.
  pub fn new() -> Self {
    PixelBuffer::default()
  }

  /// Wrap existing texels.
  ///
  /// Returns `None` if `texels` isn’t exactly `4 * width * height` bytes long.
  pub fn from_texels(size: [u32; 2], texels: Vec<u8>) -> Option<Self> {
    if texels.len() != byte_len(size) {
      return None;
    }

    Some(PixelBuffer {
      size,
      texels,
      allocations: 1,
    })
  }

  /// Make the buffer hold `size` pixels.
  ///
  /// The storage is reallocated (and zeroed) only if its byte length changes; in that case, `true`
  /// is returned. Otherwise, only the recorded dimensions are updated and the current content is
  /// left as is.
  pub fn ensure_size(&mut self, size: [u32; 2]) -> bool {
    let len = byte_len(size);
    self.size = size;

    if len == self.texels.len() {
      return false;
    }

    self.texels = vec![0; len];
    self.allocations += 1;
    true
  }

  /// Dimensions in pixels.
  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  /// Width in pixels.
  pub fn width(&self) -> u32 {
    self.size[0]
  }

  /// Height in pixels.
  pub fn height(&self) -> u32 {
    self.size[1]
  }

  /// Whether the buffer holds no pixel.
  pub fn is_empty(&self) -> bool {
    self.texels.is_empty()
  }

  /// Number of times the storage was (re)allocated.
  pub fn allocations(&self) -> usize {
    self.allocations
  }

  /// RGBA texel at `(x, y)`, if in bounds.
  pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= self.size[0] || y >= self.size[1] {
      return None;
    }

    let i = texel_offset(self.size[0], x, y);
    let t = &self.texels[i..i + PIXEL_SIZE];
    Some([t[0], t[1], t[2], t[3]])
  }

  /// Overwrite the texel at `(x, y)`. Out of bounds writes are ignored.
  pub fn set_texel(&mut self, x: u32, y: u32, texel: [u8; 4]) {
    if x >= self.size[0] || y >= self.size[1] {
      return;
    }

    let i = texel_offset(self.size[0], x, y);
    self.texels[i..i + PIXEL_SIZE].copy_from_slice(&texel);
  }

  /// Raw texels.
  pub fn as_slice(&self) -> &[u8] {
    &self.texels
  }

  /// Raw texels, mutable.
  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    &mut self.texels
  }
}

/// Byte length of an RGBA8 image.
pub fn byte_len(size: [u32; 2]) -> usize {
  size[0] as usize * size[1] as usize * PIXEL_SIZE
}

fn texel_offset(width: u32, x: u32, y: u32) -> usize {
  (y as usize * width as usize + x as usize) * PIXEL_SIZE
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reallocates_only_on_byte_length_change() {
    let mut buffer = PixelBuffer::new();

    assert!(buffer.ensure_size([4, 2]));
    assert_eq!(buffer.as_slice().len(), 32);
    assert_eq!(buffer.allocations(), 1);

    let ptr = buffer.as_slice().as_ptr();
    assert!(!buffer.ensure_size([4, 2]));
    assert!(!buffer.ensure_size([2, 4]));
    assert_eq!(buffer.size(), [2, 4]);
    assert_eq!(buffer.as_slice().as_ptr(), ptr);
    assert_eq!(buffer.allocations(), 1);

    assert!(buffer.ensure_size([4, 4]));
    assert_eq!(buffer.allocations(), 2);
  }

  #[test]
  fn texel_addressing() {
    let mut buffer = PixelBuffer::new();
    buffer.ensure_size([3, 2]);
    buffer.set_texel(2, 1, [1, 2, 3, 4]);

    assert_eq!(buffer.texel(2, 1), Some([1, 2, 3, 4]));
    assert_eq!(&buffer.as_slice()[20..24], &[1, 2, 3, 4]);
    assert_eq!(buffer.texel(3, 0), None);
    assert_eq!(buffer.texel(0, 2), None);
  }

  #[test]
  fn from_texels_checks_length() {
    assert!(PixelBuffer::from_texels([2, 2], vec![0; 16]).is_some());
    assert!(PixelBuffer::from_texels([2, 2], vec![0; 15]).is_none());
  }
}
