use crate::gles2::state::GLState;
use crate::gles2::{log_gl_errors, GLES2};
use facemap::backend::shader::{Shader, Uniformable};
use facemap::shader::{ProgramError, StageError, StageType, Uniform};
use gl::types::*;
use log::debug;
use std::cell::RefCell;
use std::ffi::CString;
use std::ptr::{null, null_mut};
use std::rc::Rc;

#[derive(Debug)]
struct Stage {
  handle: GLuint,
}

impl Drop for Stage {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteShader(self.handle);
    }
  }
}

impl Stage {
  unsafe fn new(ty: StageType, src: &str) -> Result<Self, StageError> {
    let c_src = CString::new(src.as_bytes()).map_err(|_| {
      StageError::CompilationFailed(ty, "shader source contains a nul byte".to_owned())
    })?;

    let handle = gl::CreateShader(opengl_shader_type(ty));

    if handle == 0 {
      return Err(StageError::CompilationFailed(
        ty,
        "unable to create shader stage".to_owned(),
      ));
    }

    // owned from now on, so that failures delete it
    let stage = Stage { handle };

    gl::ShaderSource(handle, 1, [c_src.as_ptr()].as_ptr(), null());
    gl::CompileShader(handle);

    let mut compiled: GLint = gl::FALSE.into();
    gl::GetShaderiv(handle, gl::COMPILE_STATUS, &mut compiled);

    if compiled == gl::TRUE.into() {
      Ok(stage)
    } else {
      let mut log_len: GLint = 0;
      gl::GetShaderiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

      let mut log: Vec<u8> = vec![0; log_len.max(0) as usize];
      gl::GetShaderInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

      Err(StageError::CompilationFailed(ty, info_log(log)))
    }
  }
}

/// A linked OpenGL ES program.
#[derive(Debug)]
pub struct Program {
  handle: GLuint,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Program {
  fn drop(&mut self) {
    self.state.borrow_mut().forget_program(self.handle);

    unsafe {
      gl::DeleteProgram(self.handle);
    }
  }
}

impl Program {
  fn link(&self) -> Result<(), ProgramError> {
    let handle = self.handle;

    unsafe {
      gl::LinkProgram(handle);

      let mut linked: GLint = gl::FALSE.into();
      gl::GetProgramiv(handle, gl::LINK_STATUS, &mut linked);

      if linked == gl::TRUE.into() {
        Ok(())
      } else {
        let mut log_len: GLint = 0;
        gl::GetProgramiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

        let mut log: Vec<u8> = vec![0; log_len.max(0) as usize];
        gl::GetProgramInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

        Err(ProgramError::LinkFailed(info_log(log)))
      }
    }
  }
}

unsafe impl Shader for GLES2 {
  type ProgramRepr = Program;

  unsafe fn new_program(
    &mut self,
    vertex: &str,
    fragment: &str,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    let vertex = Stage::new(StageType::VertexShader, vertex)?;
    let fragment = Stage::new(StageType::FragmentShader, fragment)?;

    let handle = gl::CreateProgram();

    if handle == 0 {
      return Err(ProgramError::LinkFailed(
        "unable to create program".to_owned(),
      ));
    }

    let program = Program {
      handle,
      state: self.state.clone(),
    };

    gl::AttachShader(handle, vertex.handle);
    gl::AttachShader(handle, fragment.handle);

    program.link()?;

    // stages are flagged for deletion when dropped; detach them so they go away with the program
    gl::DetachShader(handle, vertex.handle);
    gl::DetachShader(handle, fragment.handle);

    debug!("program {} linked", handle);

    Ok(program)
  }

  unsafe fn attribute_location(program: &Self::ProgramRepr, name: &str) -> Option<u32> {
    let c_name = CString::new(name.as_bytes()).ok()?;
    let location = gl::GetAttribLocation(program.handle, c_name.as_ptr() as *const GLchar);

    if location < 0 {
      None
    } else {
      Some(location as u32)
    }
  }

  unsafe fn uniform_location(program: &Self::ProgramRepr, name: &str) -> Option<i32> {
    let c_name = CString::new(name.as_bytes()).ok()?;
    let location = gl::GetUniformLocation(program.handle, c_name.as_ptr() as *const GLchar);

    if location < 0 {
      None
    } else {
      Some(location)
    }
  }

  unsafe fn use_program(program: &mut Self::ProgramRepr) {
    program.state.borrow_mut().use_program(program.handle);
    log_gl_errors("use program");
  }
}

unsafe impl Uniformable<[[f32; 4]; 4]> for GLES2 {
  unsafe fn update(_: &mut Self::ProgramRepr, uniform: &Uniform<[[f32; 4]; 4]>, value: [[f32; 4]; 4]) {
    // column-major, as cgmath stores it
    gl::UniformMatrix4fv(uniform.index(), 1, gl::FALSE, value.as_ptr() as *const GLfloat);
    log_gl_errors("set mat4 uniform");
  }
}

unsafe impl Uniformable<f32> for GLES2 {
  unsafe fn update(_: &mut Self::ProgramRepr, uniform: &Uniform<f32>, value: f32) {
    gl::Uniform1f(uniform.index(), value);
    log_gl_errors("set float uniform");
  }
}

unsafe impl Uniformable<i32> for GLES2 {
  unsafe fn update(_: &mut Self::ProgramRepr, uniform: &Uniform<i32>, value: i32) {
    gl::Uniform1i(uniform.index(), value);
    log_gl_errors("set int uniform");
  }
}

fn opengl_shader_type(t: StageType) -> GLenum {
  match t {
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
  }
}

// Info logs are nul-terminated and drivers don’t always emit valid UTF-8.
fn info_log(mut log: Vec<u8>) -> String {
  if let Some(end) = log.iter().position(|&b| b == 0) {
    log.truncate(end);
  }

  String::from_utf8_lossy(&log).trim_end().to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn info_logs_stop_at_nul() {
    let log = b"0:3: error: undeclared identifier\n\0garbage".to_vec();
    assert_eq!(info_log(log), "0:3: error: undeclared identifier");
  }

  #[test]
  fn info_logs_tolerate_bad_utf8() {
    assert_eq!(info_log(vec![b'o', b'k', 0xff]), "ok\u{fffd}");
    assert_eq!(info_log(Vec::new()), "");
  }

  #[test]
  fn stage_types() {
    assert_eq!(opengl_shader_type(StageType::VertexShader), gl::VERTEX_SHADER);
    assert_eq!(opengl_shader_type(StageType::FragmentShader), gl::FRAGMENT_SHADER);
  }
}
