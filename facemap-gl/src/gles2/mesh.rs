//! Vertex and index buffers of the tracked face.

use crate::gles2::state::{Bind, GLState};
use crate::gles2::{error_name, gl_error, log_gl_errors, GLES2};
use facemap::backend::mesh::Mesh;
use facemap::mesh::{AttributeSlots, MeshError, MeshLayout};
use gl::types::*;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

// number of float components of each attribute
const POSITION_DIM: GLint = 3;
const TEX_COORD_DIM: GLint = 2;
const NORMAL_DIM: GLint = 3;

/// Wrapped OpenGL buffer.
///
/// Used to drop the buffer.
#[derive(Debug)]
struct BufferWrapper {
  handle: GLuint,
  state: Rc<RefCell<GLState>>,
}

impl BufferWrapper {
  unsafe fn new(state: &Rc<RefCell<GLState>>) -> Result<Self, MeshError> {
    let mut handle: GLuint = 0;
    gl::GenBuffers(1, &mut handle);

    if handle == 0 {
      return Err(MeshError::CannotCreate(
        "unable to generate buffer".to_owned(),
      ));
    }

    Ok(BufferWrapper {
      handle,
      state: state.clone(),
    })
  }
}

impl Drop for BufferWrapper {
  fn drop(&mut self) {
    self.state.borrow_mut().forget_buffer(self.handle);

    unsafe {
      gl::DeleteBuffers(1, &self.handle);
    }
  }
}

/// Vertex buffer and index buffer of a face mesh.
#[derive(Debug)]
pub struct MeshBuffers {
  vbo: BufferWrapper,
  ibo: BufferWrapper,
  state: Rc<RefCell<GLState>>,
}

unsafe impl Mesh for GLES2 {
  type MeshRepr = MeshBuffers;

  unsafe fn new_mesh(&mut self) -> Result<Self::MeshRepr, MeshError> {
    let vbo = BufferWrapper::new(&self.state)?;
    let ibo = BufferWrapper::new(&self.state)?;

    Ok(MeshBuffers {
      vbo,
      ibo,
      state: self.state.clone(),
    })
  }

  unsafe fn upload(
    mesh: &mut Self::MeshRepr,
    layout: &MeshLayout,
    vertex_data: &[f32],
    indices: &[u16],
  ) -> Result<(), MeshError> {
    let mut state = mesh.state.borrow_mut();

    state.bind_array_buffer(mesh.vbo.handle, Bind::Cached);
    gl::BufferData(
      gl::ARRAY_BUFFER,
      layout.total_bytes() as GLsizeiptr,
      vertex_data.as_ptr() as _,
      gl::DYNAMIC_DRAW,
    );

    state.bind_element_array_buffer(mesh.ibo.handle, Bind::Cached);
    gl::BufferData(
      gl::ELEMENT_ARRAY_BUFFER,
      (mem::size_of::<u16>() * indices.len()) as GLsizeiptr,
      indices.as_ptr() as _,
      gl::DYNAMIC_DRAW,
    );

    match gl_error("mesh upload") {
      Some(error) => Err(MeshError::UploadFailed(error_name(error).to_owned())),
      None => Ok(()),
    }
  }

  unsafe fn bind(mesh: &mut Self::MeshRepr, layout: &MeshLayout, slots: &AttributeSlots) {
    let mut state = mesh.state.borrow_mut();

    state.bind_array_buffer(mesh.vbo.handle, Bind::Cached);
    set_vertex_attrib(slots.position, POSITION_DIM, layout.vertices_base());
    set_vertex_attrib(slots.tex_coord, TEX_COORD_DIM, layout.tex_coords_base());

    if let Some(normal) = slots.normal {
      set_vertex_attrib(normal, NORMAL_DIM, layout.normals_base());
    }

    state.bind_element_array_buffer(mesh.ibo.handle, Bind::Cached);
    log_gl_errors("bind mesh");
  }

  unsafe fn draw_indexed(_: &mut Self::MeshRepr, index_count: usize) {
    gl::DrawElements(
      gl::TRIANGLES,
      index_count as GLsizei,
      gl::UNSIGNED_SHORT,
      std::ptr::null(),
    );
    log_gl_errors("draw elements");
  }

  unsafe fn unbind(mesh: &mut Self::MeshRepr, slots: &AttributeSlots) {
    gl::DisableVertexAttribArray(slots.position);
    gl::DisableVertexAttribArray(slots.tex_coord);

    if let Some(normal) = slots.normal {
      gl::DisableVertexAttribArray(normal);
    }

    let mut state = mesh.state.borrow_mut();
    state.bind_element_array_buffer(0, Bind::Cached);
    state.bind_array_buffer(0, Bind::Cached);
    log_gl_errors("unbind mesh");
  }
}

// The array buffer holding the attribute must be bound.
unsafe fn set_vertex_attrib(index: GLuint, dim: GLint, offset: usize) {
  gl::VertexAttribPointer(index, dim, gl::FLOAT, gl::FALSE, 0, offset as *const GLvoid);
  gl::EnableVertexAttribArray(index);
}
