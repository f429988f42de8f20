use crate::gles2::{error_name, gl_error, GLES2};
use facemap::backend::readback::Readback;
use facemap::readback::ReadbackError;
use gl::types::*;

unsafe impl Readback for GLES2 {
  unsafe fn read_pixels(&mut self, size: [u32; 2], texels: &mut [u8]) -> Result<(), ReadbackError> {
    let expected = 4 * size[0] as usize * size[1] as usize;

    if texels.len() != expected {
      return Err(ReadbackError::SizeMismatch {
        expected,
        actual: texels.len(),
      });
    }

    // rows are tightly packed
    self.state.borrow_mut().set_pack_alignment(1);

    gl::ReadPixels(
      0,
      0,
      size[0] as GLsizei,
      size[1] as GLsizei,
      gl::RGBA,
      gl::UNSIGNED_BYTE,
      texels.as_mut_ptr() as _,
    );

    match gl_error("read pixels") {
      Some(error) => Err(ReadbackError::Failed(error_name(error).to_owned())),
      None => Ok(()),
    }
  }
}
