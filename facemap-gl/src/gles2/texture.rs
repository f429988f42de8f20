use crate::gles2::state::GLState;
use crate::gles2::{error_name, gl_error, log_gl_errors, GLES2};
use facemap::backend::texture::Texture as TextureBackend;
use facemap::texture::{GenMipmaps, MagFilter, MinFilter, Sampler, TextureError, Wrap};
use gl::types::*;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

/// An OpenGL ES 2D texture.
#[derive(Debug)]
pub struct Texture {
  handle: GLuint,
  sampler: Sampler,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Texture {
  fn drop(&mut self) {
    self.state.borrow_mut().forget_texture(self.handle);

    unsafe {
      gl::DeleteTextures(1, &self.handle);
    }
  }
}

unsafe impl TextureBackend for GLES2 {
  type TextureRepr = Texture;

  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    sampler: Sampler,
  ) -> Result<Self::TextureRepr, TextureError> {
    let mut handle: GLuint = 0;
    gl::GenTextures(1, &mut handle);

    if handle == 0 {
      return Err(TextureError::TextureStorageCreationFailed(
        "unable to generate texture".to_owned(),
      ));
    }

    if !npot_compatible(size, &sampler) {
      warn!(
        "{}×{} texture is not a power of two; its sampler might make it incomplete",
        size[0], size[1]
      );
    }

    let texture = Texture {
      handle,
      sampler,
      state: self.state.clone(),
    };

    self.state.borrow_mut().bind_texture(0, handle);
    apply_sampler_to_texture(gl::TEXTURE_2D, sampler);

    Ok(texture)
  }

  unsafe fn upload_rgba8(
    texture: &mut Self::TextureRepr,
    size: [u32; 2],
    texels: &[u8],
    mipmaps: GenMipmaps,
  ) -> Result<(), TextureError> {
    let expected = 4 * size[0] as usize * size[1] as usize;

    if texels.len() < expected {
      return Err(TextureError::NotEnoughPixels(expected, texels.len()));
    }

    let mut state = texture.state.borrow_mut();
    state.bind_texture(0, texture.handle);
    state.set_unpack_alignment(1);

    gl::TexImage2D(
      gl::TEXTURE_2D,
      0,
      gl::RGBA as GLint,
      size[0] as GLsizei,
      size[1] as GLsizei,
      0,
      gl::RGBA,
      gl::UNSIGNED_BYTE,
      texels.as_ptr() as _,
    );

    if mipmaps == GenMipmaps::Yes && texture.sampler.min_filter.uses_mipmaps() {
      gl::GenerateMipmap(gl::TEXTURE_2D);
    }

    match gl_error("texture upload") {
      Some(error) => Err(TextureError::UploadFailed(error_name(error).to_owned())),
      None => Ok(()),
    }
  }

  unsafe fn bind(texture: &mut Self::TextureRepr, unit: u32) {
    texture.state.borrow_mut().bind_texture(unit, texture.handle);
    log_gl_errors("bind texture");
  }

  unsafe fn unbind(texture: &mut Self::TextureRepr, unit: u32) {
    texture.state.borrow_mut().bind_texture(unit, 0);
  }
}

// The texture must be bound.
unsafe fn apply_sampler_to_texture(target: GLenum, sampler: Sampler) {
  gl::TexParameteri(
    target,
    gl::TEXTURE_WRAP_S,
    opengl_wrap(sampler.wrap_s) as GLint,
  );
  gl::TexParameteri(
    target,
    gl::TEXTURE_WRAP_T,
    opengl_wrap(sampler.wrap_t) as GLint,
  );
  gl::TexParameteri(
    target,
    gl::TEXTURE_MIN_FILTER,
    opengl_min_filter(sampler.min_filter) as GLint,
  );
  gl::TexParameteri(
    target,
    gl::TEXTURE_MAG_FILTER,
    opengl_mag_filter(sampler.mag_filter) as GLint,
  );
}

// OpenGL ES 2.0 only samples non-power-of-two textures without mipmaps and clamped to edges.
fn npot_compatible(size: [u32; 2], sampler: &Sampler) -> bool {
  let pot = size[0].is_power_of_two() && size[1].is_power_of_two();

  pot
    || (!sampler.min_filter.uses_mipmaps()
      && sampler.wrap_s == Wrap::ClampToEdge
      && sampler.wrap_t == Wrap::ClampToEdge)
}

fn opengl_wrap(wrap: Wrap) -> GLenum {
  match wrap {
    Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
    Wrap::Repeat => gl::REPEAT,
    Wrap::MirroredRepeat => gl::MIRRORED_REPEAT,
  }
}

fn opengl_min_filter(filter: MinFilter) -> GLenum {
  match filter {
    MinFilter::Nearest => gl::NEAREST,
    MinFilter::Linear => gl::LINEAR,
    MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
    MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
    MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
    MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
  }
}

fn opengl_mag_filter(filter: MagFilter) -> GLenum {
  match filter {
    MagFilter::Nearest => gl::NEAREST,
    MagFilter::Linear => gl::LINEAR,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_sampler_is_trilinear() {
    let sampler = Sampler::default();

    assert_eq!(opengl_min_filter(sampler.min_filter), gl::LINEAR_MIPMAP_LINEAR);
    assert_eq!(opengl_mag_filter(sampler.mag_filter), gl::LINEAR);
    assert_eq!(opengl_wrap(sampler.wrap_s), gl::CLAMP_TO_EDGE);
  }

  #[test]
  fn atlas_is_power_of_two() {
    assert!(npot_compatible([256, 256], &Sampler::default()));
  }

  #[test]
  fn npot_needs_clamped_unmipmapped_sampling() {
    let mipmapped = Sampler::default();
    assert!(!npot_compatible([640, 480], &mipmapped));

    let plain = Sampler {
      min_filter: MinFilter::Linear,
      ..Sampler::default()
    };
    assert!(npot_compatible([640, 480], &plain));

    let repeated = Sampler {
      wrap_s: Wrap::Repeat,
      ..plain
    };
    assert!(!npot_compatible([640, 480], &repeated));
  }
}
